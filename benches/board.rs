use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use order_stream::model::{OrderStatus, PaymentStatus};
use order_stream::{Amount, Order, OrderBoard, OrderId, StreamEvent};

fn order(n: u32, status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(format!("o{n}")),
        order_number: n.to_string(),
        status,
        payment_status: PaymentStatus::Pending,
        total: Amount::from_cents(2500),
        items: Vec::new(),
        customer: None,
        created_at: None,
        updated_at: None,
    }
}

/// Generates a realistic stream for one store.
///
/// Pattern (repeating):
/// 1. New order `n`
/// 2. Order `n - 1` advances one stage
/// 3. Every `cancel_every`th step, the oldest open order is cancelled
///
/// Updates always target an order still on the board.
pub struct EventGenerator {
    next_order: u32,
    remaining: u32,
    cancel_every: u32,
    oldest_open: u32,
    pending: Vec<StreamEvent>,
}

impl EventGenerator {
    pub fn new(orders: u32, cancel_every: u32) -> Self {
        Self {
            next_order: 1,
            remaining: orders,
            cancel_every,
            oldest_open: 1,
            pending: Vec::new(),
        }
    }
}

impl Iterator for EventGenerator {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop() {
            return Some(event);
        }
        if self.remaining == 0 {
            return None;
        }

        let n = self.next_order;
        self.next_order += 1;
        self.remaining -= 1;

        if n > self.oldest_open {
            self.pending.push(StreamEvent::OrderUpdated {
                order: order(n - 1, OrderStatus::Confirmed),
                timestamp: None,
            });
        }
        if self.cancel_every > 0 && n % self.cancel_every == 0 && self.oldest_open < n - 1 {
            self.pending.push(StreamEvent::OrderCancelled {
                id: OrderId::new(format!("o{}", self.oldest_open)),
                timestamp: None,
            });
            self.oldest_open += 1;
        }

        Some(StreamEvent::NewOrder {
            order: order(n, OrderStatus::Received),
            timestamp: None,
        })
    }
}

fn bench_new_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("new_orders");

    for count in [100u32, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut board = OrderBoard::new();
                let new_orders = EventGenerator::new(count, 0)
                    .filter(|e| matches!(e, StreamEvent::NewOrder { .. }));
                for event in new_orders {
                    let _ = black_box(board.apply(event));
                }
                board
            });
        });
    }

    group.finish();
}

fn bench_busy_evening(c: &mut Criterion) {
    let mut group = c.benchmark_group("busy_evening");

    // a board that keeps growing while older orders get cancelled
    for (orders, cancel_every) in [(500, 3), (2_000, 10)] {
        let label = format!("{orders}o_cancel{cancel_every}");
        group.bench_with_input(
            BenchmarkId::from_parameter(&label),
            &(orders, cancel_every),
            |b, &(orders, cancel_every)| {
                b.iter(|| {
                    let mut board = OrderBoard::new();
                    for event in EventGenerator::new(orders, cancel_every) {
                        let _ = black_box(board.apply(event));
                    }
                    board
                });
            },
        );
    }

    group.finish();
}

fn bench_seed(c: &mut Criterion) {
    let history: Vec<Order> = (1..=1_000)
        .rev()
        .map(|n| order(n, OrderStatus::Delivered))
        .collect();

    c.bench_function("seed_1000_history", |b| {
        b.iter(|| {
            let mut board = OrderBoard::new();
            black_box(board.seed(history.clone()));
            board
        });
    });
}

criterion_group!(benches, bench_new_orders, bench_busy_evening, bench_seed);
criterion_main!(benches);
