use anyhow::{bail, Result};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTable {
        name: String,
        specs: Vec<String>,
    },
    ListTables,
    DropTable {
        name: String,
    },
    Insert {
        table: String,
        values: Vec<String>,
    },
    Select {
        table: String,
        filter: Option<(String, String)>,
    },
    Update {
        table: String,
        set: (String, String),
        filter: (String, String),
    },
    Delete {
        table: String,
        filter: (String, String),
    },
    Info {
        name: String,
    },
    Help,
    Exit,
    Empty,
    Unknown(String),
}

/// Split a line into tokens: whitespace-separated words, quote-aware (a
/// quoted run is one token, quotes kept for the typed-value parser), with
/// `(`, `)` and `,` as standalone tokens.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                current.push('"');
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == '"' {
                        break;
                    }
                }
            }
            '(' | ')' | ',' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a `col = value` clause (exactly three tokens; only `=` is
/// supported).
fn parse_clause(tokens: &[&str], kind: &str) -> Result<(String, String)> {
    let [column, op, value] = tokens else {
        bail!("malformed {kind} clause, expected: <column> = <value>");
    };
    if *op != "=" {
        bail!("only the '=' operator is supported in {kind}");
    }
    Ok(((*column).to_owned(), (*value).to_owned()))
}

/// Parse `( v1 , v2 , ... )` into the raw value list.
fn parse_value_list(tokens: &[&str]) -> Result<Vec<String>> {
    let inner = match tokens {
        ["(", inner @ .., ")"] => inner,
        _ => bail!("malformed values list, expected: (v1, v2, ...)"),
    };
    let mut values = Vec::new();
    let mut expect_value = true;
    for token in inner {
        if *token == "," {
            if expect_value {
                bail!("malformed values list, expected: (v1, v2, ...)");
            }
            expect_value = true;
        } else {
            if !expect_value {
                bail!("malformed values list, expected: (v1, v2, ...)");
            }
            values.push((*token).to_owned());
            expect_value = false;
        }
    }
    if expect_value && !values.is_empty() {
        bail!("malformed values list, expected: (v1, v2, ...)");
    }
    Ok(values)
}

/// Parse one input line into a `Command`.
///
/// Verbs are case-insensitive; table and column names are not. An
/// unrecognized verb becomes `Command::Unknown` so the caller can report it
/// without ending the session.
pub fn parse(line: &str) -> Result<Command> {
    let tokens = tokenize(line);
    let Some(verb) = tokens.first() else {
        return Ok(Command::Empty);
    };
    let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();

    match verb.to_ascii_lowercase().as_str() {
        "create_table" => {
            let [_, name, specs @ ..] = refs.as_slice() else {
                bail!("usage: create_table <name> <column:type> ...");
            };
            if specs.is_empty() {
                bail!("usage: create_table <name> <column:type> ...");
            }
            Ok(Command::CreateTable {
                name: (*name).to_owned(),
                specs: specs.iter().map(|s| (*s).to_owned()).collect(),
            })
        }
        "list_tables" => Ok(Command::ListTables),
        "drop_table" => {
            let [_, name] = refs.as_slice() else {
                bail!("usage: drop_table <name>");
            };
            Ok(Command::DropTable {
                name: (*name).to_owned(),
            })
        }
        "insert" => {
            let ["insert", "into", table, "values", rest @ ..] = refs.as_slice() else {
                bail!("usage: insert into <table> values (v1, v2, ...)");
            };
            Ok(Command::Insert {
                table: (*table).to_owned(),
                values: parse_value_list(rest)?,
            })
        }
        "select" => match refs.as_slice() {
            ["select", "from", table] => Ok(Command::Select {
                table: (*table).to_owned(),
                filter: None,
            }),
            ["select", "from", table, "where", clause @ ..] => Ok(Command::Select {
                table: (*table).to_owned(),
                filter: Some(parse_clause(clause, "WHERE")?),
            }),
            _ => bail!("usage: select from <table> [where <column> = <value>]"),
        },
        "update" => {
            let ["update", table, "set", rest @ ..] = refs.as_slice() else {
                bail!("usage: update <table> set <column> = <value> where <column> = <value>");
            };
            let Some(where_pos) = rest.iter().position(|t| *t == "where") else {
                bail!("usage: update <table> set <column> = <value> where <column> = <value>");
            };
            let set = parse_clause(&rest[..where_pos], "SET")?;
            let filter = parse_clause(&rest[where_pos + 1..], "WHERE")?;
            Ok(Command::Update {
                table: (*table).to_owned(),
                set,
                filter,
            })
        }
        "delete" => {
            let ["delete", "from", table, "where", clause @ ..] = refs.as_slice() else {
                bail!("usage: delete from <table> where <column> = <value>");
            };
            Ok(Command::Delete {
                table: (*table).to_owned(),
                filter: parse_clause(clause, "WHERE")?,
            })
        }
        "info" => {
            let [_, name] = refs.as_slice() else {
                bail!("usage: info <table>");
            };
            Ok(Command::Info {
                name: (*name).to_owned(),
            })
        }
        "help" => Ok(Command::Help),
        "exit" => Ok(Command::Exit),
        _ => Ok(Command::Unknown(verb.clone())),
    }
}
