//! Criterion benchmarks for the main evaluation paths.

use calc_rs::Session;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_simple_arithmetic(c: &mut Criterion) {
    let mut session = Session::new();
    c.bench_function("parse_simple", |b| {
        b.iter(|| session.parse(black_box("2 + 3 * 4 - 5 / 2")).unwrap())
    });
}

fn bench_nested_groups(c: &mut Criterion) {
    let mut session = Session::new();
    c.bench_function("parse_nested", |b| {
        b.iter(|| {
            session
                .parse(black_box("5^2 * (2 + 3 * (4 - 1)) + 5!/4"))
                .unwrap()
        })
    });
}

fn bench_user_function(c: &mut Criterion) {
    let mut session = Session::new();
    session.add_expression("f(x, y) = 2(x + y)").unwrap();
    session.add_variable_value("x0", 5.0).unwrap();
    c.bench_function("parse_user_function", |b| {
        b.iter(|| session.parse(black_box("1 + 2f(x0, 3)/3")).unwrap())
    });
}

fn bench_integral(c: &mut Criterion) {
    let mut session = Session::new();
    c.bench_function("parse_integral", |b| {
        b.iter(|| {
            session
                .parse(black_box("∫(x, (x^3)/(x+1), 5, 10)"))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_simple_arithmetic,
    bench_nested_groups,
    bench_user_function,
    bench_integral
);
criterion_main!(benches);
