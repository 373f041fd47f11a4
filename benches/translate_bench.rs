use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use predicate_translator::binder::FilterScopedNaming;
use predicate_translator::catalog::{EntityType, InMemoryCatalog};
use predicate_translator::fields::BindingContext;
use predicate_translator::lexer::Lexer;
use predicate_translator::lowering::to_simple_expr;
use predicate_translator::parser::Parser;
use predicate_translator::translator::translate;
use predicate_translator::types::ScalarKind;
use std::hint::black_box;

const TEST_CASES: &[(&str, &str)] = &[
    ("simple", r#"(e: Order) => e.Status == "Open""#),
    (
        "medium",
        r#"(e: Order, minTotal: decimal?) => e.Status != "Closed" && e.Total.Value >= minTotal && (long)e.Id > 100L"#,
    ),
    (
        "membership",
        "(e: Order, ids: List<int>, extra: int) => ids.Contains(e.Id) || new List<int> { 1, 2, 3, 4, 5, 6, 7, 8, 9, 10 }.Contains(e.Id) || new List<int> { extra, 11 }.Contains(e.TenantId.Value)",
    ),
];

// 创建一个目录实例
fn create_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .field("Order", "Id", "order_id", ScalarKind::Int32)
        .field("Order", "Status", "status", ScalarKind::String)
        .nullable_field("Order", "Total", "total", ScalarKind::Decimal)
        .nullable_field("Order", "TenantId", "tenant_id", ScalarKind::Int32)
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, source) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), source, |b, &source| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(source)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：语法分析性能
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, source) in TEST_CASES {
        // 预先词法分析
        let tokens: Vec<_> = Lexer::new(source).collect();

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| {
                let mut parser = Parser::new(black_box(tokens));
                match parser.parse() {
                    Ok(predicate) => black_box(predicate),
                    Err(_) => panic!("解析失败"),
                }
            })
        });
    }

    group.finish();
}

// 基准测试：翻译性能
fn benchmark_translate(c: &mut Criterion) {
    let catalog = create_catalog();
    let binding = BindingContext::new("Extent1", EntityType::new("Order"));
    let naming = FilterScopedNaming::new("Bench");

    let mut group = c.benchmark_group("translate_performance");

    for (name, source) in TEST_CASES {
        // 预处理：词法分析和语法分析
        let tokens: Vec<_> = Lexer::new(source).collect();
        let predicate = Parser::new(&tokens).parse().expect("解析应该成功");

        group.bench_with_input(BenchmarkId::new("translate", name), &predicate, |b, predicate| {
            b.iter(|| {
                match translate(black_box(predicate), &binding, &catalog, &naming) {
                    Ok(translation) => black_box(translation),
                    Err(_) => panic!("翻译失败"),
                }
            })
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理
fn benchmark_end_to_end(c: &mut Criterion) {
    let catalog = create_catalog();
    let binding = BindingContext::new("Extent1", EntityType::new("Order"));
    let naming = FilterScopedNaming::new("Bench");

    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, source) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), source, |b, &source| {
            b.iter(|| {
                // 完整的处理流程
                let tokens: Vec<_> = Lexer::new(black_box(source)).collect();
                let predicate = Parser::new(&tokens).parse().expect("解析应该成功");
                let translation =
                    translate(&predicate, &binding, &catalog, &naming).expect("翻译应该成功");
                black_box(to_simple_expr(&translation.expression))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_translate,
    benchmark_end_to_end
);
criterion_main!(benches);
