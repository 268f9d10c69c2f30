use crate::command::{self, Command};
use crate::render;
use minidb_core::Database;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

const PROMPT: &str = "db> ";

const HELP: &str = "\
commands:
  create_table <name> <column:type> ...   create a table (types: int, str, bool)
  list_tables                             list all tables
  drop_table <name>                       drop a table (asks for confirmation)
  insert into <name> values (v1, v2, ...) insert a row; ID is assigned automatically
  select from <name> [where <col> = <v>]  show rows, optionally filtered
  update <name> set <col> = <v> where <col> = <v>
  delete from <name> where <col> = <v>    delete rows (asks for confirmation)
  info <name>                             show a table's columns
  help                                    this message
  exit                                    leave the session";

/// What one dispatched command produced.
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            text: "Leaving the session...".to_owned(),
            quit: true,
        }
    }
}

/// Execute one parsed command against the database.
///
/// This is the guarded boundary: every engine error is turned into a
/// one-line reply and never escapes, so the session survives any single
/// failed command. `confirm` gates the destructive commands; declining
/// leaves state untouched.
pub fn execute(
    db: &mut Database,
    cmd: Command,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Reply {
    match cmd {
        Command::CreateTable { name, specs } => match db.create_table(&name, &specs) {
            Ok(schema) => Reply::text(format!(
                "Table \"{name}\" created with columns: {}",
                schema.describe()
            )),
            Err(e) => Reply::text(format!("Error: {e}")),
        },
        Command::ListTables => {
            if db.is_empty() {
                Reply::text("No tables.")
            } else {
                let lines: Vec<String> =
                    db.table_names().map(|name| format!("- {name}")).collect();
                Reply::text(lines.join("\n"))
            }
        }
        Command::DropTable { name } => {
            if !db.has_table(&name) {
                return Reply::text(format!("Error: table \"{name}\" does not exist"));
            }
            if !confirm(&format!("drop table \"{name}\"")) {
                return Reply::text("Operation cancelled.");
            }
            match db.drop_table(&name) {
                Ok(()) => Reply::text(format!("Table \"{name}\" dropped.")),
                Err(e) => Reply::text(format!("Error: {e}")),
            }
        }
        Command::Insert { table, values } => match db.insert(&table, &values) {
            Ok(id) => Reply::text(format!(
                "Row with ID={id} inserted into table \"{table}\"."
            )),
            Err(e) => Reply::text(format!("Error: {e}")),
        },
        Command::Select { table, filter } => {
            let filter_ref = filter.as_ref().map(|(c, v)| (c.as_str(), v.as_str()));
            match db.select(&table, filter_ref) {
                Ok((rows, hit)) => {
                    if hit {
                        debug!(table = %table, "served from cache");
                    }
                    if rows.is_empty() {
                        Reply::text("(no rows)")
                    } else {
                        // describe() cannot fail here: select already
                        // resolved the table.
                        match db.describe(&table) {
                            Ok(schema) => Reply::text(render::render_rows(schema, &rows)),
                            Err(e) => Reply::text(format!("Error: {e}")),
                        }
                    }
                }
                Err(e) => Reply::text(format!("Error: {e}")),
            }
        }
        Command::Update { table, set, filter } => {
            match db.update(&table, &set.0, &set.1, &filter.0, &filter.1) {
                Ok(outcome) => match outcome.updated_ids.as_slice() {
                    [] => Reply::text("Nothing to update."),
                    [id] => Reply::text(format!(
                        "Row with ID={id} updated in table \"{table}\"."
                    )),
                    ids => Reply::text(format!(
                        "Updated {} rows in table \"{table}\".",
                        ids.len()
                    )),
                },
                Err(e) => Reply::text(format!("Error: {e}")),
            }
        }
        Command::Delete { table, filter } => {
            if !db.has_table(&table) {
                return Reply::text(format!("Error: table \"{table}\" does not exist"));
            }
            if !confirm(&format!("delete rows from \"{table}\"")) {
                return Reply::text("Operation cancelled.");
            }
            match db.delete(&table, &filter.0, &filter.1) {
                Ok(outcome) => match outcome.deleted_ids.as_slice() {
                    [] => Reply::text("Nothing to delete."),
                    [id] => Reply::text(format!(
                        "Row with ID={id} deleted from table \"{table}\"."
                    )),
                    ids => Reply::text(format!(
                        "Deleted {} rows from table \"{table}\".",
                        ids.len()
                    )),
                },
                Err(e) => Reply::text(format!("Error: {e}")),
            }
        }
        Command::Info { name } => match db.describe(&name) {
            Ok(schema) => Reply::text(render::render_schema(&name, schema)),
            Err(e) => Reply::text(format!("Error: {e}")),
        },
        Command::Help => Reply::text(HELP),
        Command::Exit => Reply::quit(),
        Command::Empty => Reply::text(""),
        Command::Unknown(verb) => Reply::text(format!(
            "Unknown command: {verb}. Type \"help\" for the command list."
        )),
    }
}

/// The interactive loop. Only `exit` or end-of-input leaves it.
pub fn run(db: &mut Database) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("minidb interactive session. Type \"help\" for commands.");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let cmd = match command::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("Error: {e}");
                continue;
            }
        };

        let mut confirm = |action: &str| {
            let answer = editor
                .readline(&format!("Are you sure you want to {action}? [y/n]: "))
                .unwrap_or_default();
            answer.trim().eq_ignore_ascii_case("y")
        };
        let reply = execute(db, cmd, &mut confirm);
        if !reply.text.is_empty() {
            println!("{}", reply.text);
        }
        if reply.quit {
            break;
        }
    }
    Ok(())
}
