///
/// sqlbind CLI - Ad-hoc database access through the sqlbind library
///
/// Provides two commands over a database file:
/// - sqlbind exec <db> <sql>: run every statement to completion and
///   report how many rows the last change touched
/// - sqlbind query <db> <sql>: run the statements and print each
///   result row, one line per row, columns separated by tabs
///

use clap::{Parser, Subcommand};

use sqlbind::{Connection, Rows, Value};

#[derive(Parser)]
#[command(name = "sqlbind")]
#[command(author, version, about = "Typed SQLite access from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run statements without printing result rows
    Exec {
        /// Database file (created if absent)
        database: String,

        /// One or more SQL statements
        sql: String,
    },

    /// Run statements and print every result row
    Query {
        /// Database file (created if absent)
        database: String,

        /// One or more SQL statements
        sql: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Exec { database, sql } => exec(&database, &sql),
        Commands::Query { database, sql } => query(&database, &sql),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn exec(database: &str, sql: &str) -> sqlbind::Result<()> {
    let db = Connection::open(database)?;
    db.run(sql, &())?;
    println!("{} row(s) changed", db.changes());
    Ok(())
}

fn query(database: &str, sql: &str) -> sqlbind::Result<()> {
    let db = Connection::open(database)?;
    let mut rows: Rows<'_, '_, ()> = db.execute(sql, &())?;
    while let Some(row) = rows.next_row()? {
        let mut line = String::new();
        for index in 0..row.column_count() {
            if index > 0 {
                line.push('\t');
            }
            match row.value(index)? {
                Value::Integer(v) => line.push_str(&v.to_string()),
                Value::Float(v) => line.push_str(&v.to_string()),
                Value::Text(v) => line.push_str(v),
                Value::Blob(v) => {
                    line.push_str("x'");
                    for byte in v {
                        line.push_str(&format!("{byte:02x}"));
                    }
                    line.push('\'');
                }
                Value::Null => line.push_str("NULL"),
            }
        }
        println!("{line}");
    }
    Ok(())
}
