//! odataq - compile and run OData queries from the command line
//!
//! Operations are written `kind:argument`, in the order they apply.

use anyhow::{Context, bail};
use clap::Parser;
use odata_client::ODataService;
use odata_query::advanced::{Expr, Value, parse};
use odata_query::{PartArg, Query, QueryKind, QueryOptions, QueryPart, Transport};

#[derive(Parser)]
#[command(name = "odataq")]
#[command(about = "Query an OData service with lambda expressions")]
#[command(after_help = "\
EXAMPLES:
    # Print the compiled parameters only
    odataq --dry-run --pascalize Companies 'where:c => c.name.startsWith(\"A\")' take:10

    # Ordering operations merge into one $orderby
    odataq --base http://localhost:8080/odata Companies 'orderBy:c => c.name' 'thenByDescending:c => c.id'

    # Captured variables render as literals
    odataq --var minId=3 Companies 'where:c => c.id > minId' inlineCount:true
")]
struct Args {
    /// Collection path, e.g. Companies
    collection: String,

    /// Operations as kind:argument (where, select, orderBy, orderByDescending,
    /// thenBy, thenByDescending, skip, take, inlineCount)
    operations: Vec<String>,

    /// Service root
    #[arg(long, default_value = "http://localhost:8080/odata")]
    base: String,

    /// Capture a variable for lambdas: name=literal (number, string, true/false/null)
    #[arg(long = "var", value_name = "NAME=LITERAL")]
    vars: Vec<String>,

    /// Upper-case the first letter of member names
    #[arg(long)]
    pascalize: bool,

    /// Extra options as a JSON object, e.g. '{"headers": {"Accept": "application/json"}}'
    #[arg(long)]
    options: Option<String>,

    /// Print compiled parameters instead of sending the request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let service = ODataService::new(&args.base);

    let mut query = service
        .create_query(&args.collection)
        .with_options(QueryOptions::new().with_pascalize(args.pascalize));
    if let Some(json) = &args.options {
        let options = QueryOptions::from_json(json).context("invalid --options")?;
        query = query.with_options(options);
    }
    for var in &args.vars {
        let (name, value) = parse_var(var)?;
        query = query.capture(name, value);
    }
    for op in &args.operations {
        query = apply_operation(query, op)?;
    }

    if args.dry_run {
        let compiled = query.parameters()?;
        for param in &compiled.params {
            println!("{}={}", param.key, param.value);
        }
        return Ok(());
    }

    log::info!("Querying {}/{}", args.base.trim_end_matches('/'), args.collection);
    let result = query.to_array().await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn apply_operation<'p, T: Transport>(query: Query<'p, T>, op: &str) -> anyhow::Result<Query<'p, T>> {
    let Some((kind, argument)) = op.split_once(':') else {
        bail!("operation '{}' must be written kind:argument", op);
    };
    let kind: QueryKind = kind.trim().parse()?;
    let argument = argument.trim();

    let part = match kind {
        QueryKind::Skip | QueryKind::Take | QueryKind::InlineCount => {
            QueryPart::new(kind, vec![PartArg::Literal(parse_literal(argument)?)])
        }
        kind => {
            let expr = parse(argument).with_context(|| format!("invalid lambda in '{}'", op))?;
            return Ok(query.with_expr(kind, expr));
        }
    };
    Ok(query.push(part))
}

fn parse_var(var: &str) -> anyhow::Result<(String, Value)> {
    let Some((name, literal)) = var.split_once('=') else {
        bail!("--var '{}' must be written name=literal", var);
    };
    Ok((name.trim().to_string(), parse_literal(literal.trim())?))
}

/// Literal argument; anything that is not a literal is taken as a bare string
fn parse_literal(text: &str) -> anyhow::Result<Value> {
    match parse(text) {
        Ok(Expr::Literal(value)) => Ok(value),
        Ok(Expr::Unary { operator, target }) if operator == "-" => match *target {
            Expr::Literal(Value::Int(n)) => Ok(Value::Int(-n)),
            Expr::Literal(Value::Float(n)) => Ok(Value::Float(-n)),
            _ => bail!("'{}' is not a literal", text),
        },
        _ => Ok(Value::String(text.to_string())),
    }
}
