use serde::Serialize;
use std::io;

use crate::model::Order;

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    order_number: &'a str,
    id: &'a str,
    status: &'static str,
    payment_status: String,
    items: u32,
    total: String,
}

/// Write a board snapshot in csv format, one row per order in board order
pub fn write_orders<'a, W: io::Write>(
    writer: W,
    orders: impl IntoIterator<Item = &'a Order>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut empty = true;

    for order in orders {
        empty = false;
        let row = OutputRow {
            order_number: &order.order_number,
            id: order.id.as_str(),
            status: order.status.as_str(),
            payment_status: order.payment_status.to_string(),
            items: order.item_count(),
            total: order.total.to_string(),
        };
        writer.serialize(&row)?;
    }

    // serialize() only emits the header with the first row
    if empty {
        writer.write_record([
            "order_number",
            "id",
            "status",
            "payment_status",
            "items",
            "total",
        ])?;
    }

    writer.flush()?;
    Ok(())
}
