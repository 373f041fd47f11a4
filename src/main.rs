use anyhow::{anyhow, Context};
use predicate_translator::binder::FilterScopedNaming;
use predicate_translator::catalog::{EntityType, InMemoryCatalog};
use predicate_translator::config::CatalogConfig;
use predicate_translator::fields::BindingContext;
use predicate_translator::lowering::preview_select;
use predicate_translator::parser::parse_predicate;
use predicate_translator::translator::{translate, Translation};
use predicate_translator::types::{ScalarKind, SourceType};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = "catalog.json";
const ROW_VARIABLE: &str = "Extent1";

/// 加载目录，优先使用JSON配置，失败时使用内置示例目录
fn load_catalog(path: &str) -> InMemoryCatalog {
    match CatalogConfig::from_json_file(path) {
        Ok(config) => {
            println!("✅ 成功从JSON配置文件加载目录: {}", path);
            println!("✅ 加载了 {} 个实体", config.entity_count());
            config.into_catalog()
        }
        Err(e) => {
            println!("⚠️ 无法加载JSON配置文件 ({}), 使用内置示例目录", e);
            demo_catalog()
        }
    }
}

/// 内置示例目录
fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .field("Order", "Id", "order_id", ScalarKind::Int32)
        .field("Order", "Status", "status", ScalarKind::String)
        .field("Order", "CustomerId", "customer_id", ScalarKind::Guid)
        .field("Order", "PlacedAt", "placed_at", ScalarKind::DateTime)
        .nullable_field("Order", "Total", "total", ScalarKind::Decimal)
        .nullable_field("Order", "TenantId", "tenant_id", ScalarKind::Int32)
        .field("Customer", "Id", "customer_id", ScalarKind::Guid)
        .field("Customer", "Name", "display_name", ScalarKind::String)
        .field("Customer", "IsDeleted", "is_deleted", ScalarKind::Boolean)
}

fn print_usage() {
    println!("命令:");
    println!("  <predicate>        - 翻译谓词并打印目标表达式和参数表");
    println!("  :sql <predicate>   - 预览 SELECT ... WHERE 语句");
    println!("  :json <predicate>  - 以JSON打印参数表");
    println!("  :help              - 显示帮助");
    println!("  :quit              - 退出");
    println!();
    println!("示例:");
    println!(r#"  (e: Order, minTotal: decimal?) => e.Status == "Open" && e.Total.Value >= minTotal"#);
    println!("  (e: Order, ids: List<int>) => ids.Contains(e.Id) || new List<int> {{ 1, 2, 3 }}.Contains(e.Id)");
}

/// 解析并翻译谓词，同时返回被过滤的实体名
fn run(source: &str, catalog: &InMemoryCatalog) -> anyhow::Result<(Translation, String)> {
    let predicate = parse_predicate(source).context("解析失败")?;

    let entity = match predicate.row_parameter() {
        Some((_, SourceType::Entity(name) | SourceType::Interface(name))) => name.clone(),
        _ => return Err(anyhow!("谓词缺少实体类型的参数")),
    };
    let binding = BindingContext::new(ROW_VARIABLE, EntityType::new(entity.as_str()));
    let naming = FilterScopedNaming::new("Repl");

    let translation = translate(&predicate, &binding, catalog, &naming).context("翻译失败")?;
    Ok((translation, entity))
}

fn print_translation(translation: &Translation) {
    println!("{}", translation.expression);
    if !translation.parameters.is_empty() {
        println!("参数:");
        for parameter in translation.parameters.iter() {
            println!("  {} -> @{} : {}", parameter.logical_name, parameter.name, parameter.ty);
        }
    }
}

fn execute(line: &str, catalog: &InMemoryCatalog) -> anyhow::Result<()> {
    let (command, argument) = match line.split_once(' ') {
        Some((command, rest)) if command.starts_with(':') => (command, rest.trim()),
        _ if line.starts_with(':') => (line, ""),
        _ => ("", line),
    };

    match command {
        "" => print_translation(&run(argument, catalog)?.0),
        ":sql" => {
            let (translation, entity) = run(argument, catalog)?;
            println!("{}", preview_select(&translation.expression, &entity, ROW_VARIABLE));
        }
        ":json" => {
            let (translation, _) = run(argument, catalog)?;
            println!("{}", translation.parameters.to_json()?);
        }
        ":help" | ":h" => print_usage(),
        other => println!("未知命令: {} (输入 :help 查看帮助)", other),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("--- Predicate Translator: 谓词到查询表达式 ---");

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CATALOG.to_string());
    let catalog = load_catalog(&path);
    println!("输入 :help 查看命令\n");

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("predicate> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(input)?;

                if matches!(input, ":quit" | ":q") {
                    break;
                }
                if let Err(e) = execute(input, &catalog) {
                    eprintln!("✗ {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
