//! `recordmap` entry point.
//!
//! # Responsibility
//! - Open a SQLite database and inspect tables through record types.
//! - Print results as JSON for scripting.

mod args;

use args::{Cli, Commands, TableArgs};
use clap::Parser;
use recordmap_core::{
    default_log_level, init_logging, open_db, FinderArg, RecordType, StorageConnection, Value,
};
use std::error::Error;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        log::error!("event=cli_command module=cli status=error error={err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    match cli.command {
        Commands::Ping => {
            println!("recordmap_core ping={}", recordmap_core::ping());
            println!("recordmap_core version={}", recordmap_core::core_version());
        }
        Commands::Columns(args) => {
            let records = record_type(cli.db.as_deref(), &args)?;
            print_json(&records.columns()?)?;
        }
        Commands::Count(args) => {
            let records = record_type(cli.db.as_deref(), &args.table)?;
            let params = args.params.iter().map(|raw| parse_value(raw)).collect();
            let count =
                records.count_where(args.where_fragment.as_deref().unwrap_or(""), params)?;
            println!("{count}");
        }
        Commands::Get(args) => {
            let records = record_type(cli.db.as_deref(), &args.table)?;
            match records.get_by_id(parse_value(&args.id))? {
                Some(record) => print_json(&record)?,
                None => println!("null"),
            }
        }
        Commands::FindBy(args) => {
            let records = record_type(cli.db.as_deref(), &args.table)?;
            let found = records.find_by(&args.field, finder_arg(&args.values))?;
            print_json(&found)?;
        }
    }

    Ok(())
}

fn record_type(db: Option<&str>, args: &TableArgs) -> CliResult<Arc<RecordType>> {
    let path = db.ok_or("a database path is required (--db or RECORDMAP_DB)")?;
    let conn: Arc<dyn StorageConnection> = Arc::new(open_db(path)?);
    let records = RecordType::builder(args.table.as_str())
        .primary_key(args.primary_key.as_str())
        .build(conn)?;
    Ok(records)
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Integers bind as integers; everything else binds as text.
fn parse_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::Integer)
        .unwrap_or_else(|_| Value::from(raw))
}

fn finder_arg(values: &[String]) -> FinderArg {
    match values {
        [single] => FinderArg::Scalar(parse_value(single)),
        many => FinderArg::List(many.iter().map(|raw| parse_value(raw)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::{finder_arg, parse_value, Cli, Commands};
    use clap::Parser;
    use recordmap_core::{FinderArg, Value};

    #[test]
    fn parse_value_prefers_integers() {
        assert_eq!(parse_value("42"), Value::Integer(42));
        assert_eq!(parse_value("4x"), Value::from("4x"));
    }

    #[test]
    fn finder_arg_switches_to_list_for_many_values() {
        assert_eq!(
            finder_arg(&["Books".to_string()]),
            FinderArg::Scalar(Value::from("Books"))
        );
        assert_eq!(
            finder_arg(&["1".to_string(), "b".to_string()]),
            FinderArg::List(vec![Value::Integer(1), Value::from("b")])
        );
    }

    #[test]
    fn parses_count_with_where_fragment_and_params() {
        let cli = Cli::try_parse_from([
            "recordmap",
            "--db",
            "/tmp/app.db",
            "count",
            "categories",
            "--where",
            "`name` = ?",
            "Books",
        ])
        .unwrap();

        assert_eq!(cli.db.as_deref(), Some("/tmp/app.db"));
        match cli.command {
            Commands::Count(args) => {
                assert_eq!(args.table.table, "categories");
                assert_eq!(args.table.primary_key, "id");
                assert_eq!(args.where_fragment.as_deref(), Some("`name` = ?"));
                assert_eq!(args.params, vec!["Books".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn find_by_requires_a_value() {
        assert!(Cli::try_parse_from(["recordmap", "find-by", "categories", "name"]).is_err());
    }
}
