use std::{env, process::ExitCode};

use pagedarray::{
    FilePageStore, PageStore, PagedArray, StoreConfig,
    types::{PageId, RowId},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = ".pagedarray_history";

type Array = PagedArray<FilePageStore>;

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "pagedarray> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // Trailing backslash continues the command on the next line
        if let Some(stripped) = trimmed_line.strip_suffix('\\') {
            input.push_str(stripped);
            input.push(' ');
            prompt = "         -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

fn parse_row_id(arg: Option<&str>) -> Result<RowId, String> {
    arg.ok_or_else(|| "missing row id".to_string())?
        .parse::<RowId>()
        .map_err(|e| format!("invalid row id: {}", e))
}

fn process_command(array: &mut Array, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let Some(cmd) = parts.next() else {
        return true;
    };

    let outcome: Result<(), String> = match cmd.to_lowercase().as_str() {
        "exit" | "quit" | "q" => {
            if let Err(e) = array.flush() {
                eprintln!("Flush failed: {}", e);
            }
            println!("Goodbye!");
            return false;
        }
        "help" | "h" => {
            println!(
                r#"
Available commands:
  help, h          - Show this help message
  stats            - Show page and item counts
  dump             - Walk every catalog and data page
  alloc [n]        - Append n zero-filled records (default 1)
  resolve <row>    - Show the page and slot holding a row
  read <row>       - Show a row's bytes
  delete <row>     - Tombstone a row
  flush            - Write dirty pages to disk
  exit, quit, q    - Flush and exit

Use '\' at the end of a line for multiline input.
"#
            );
            Ok(())
        }
        "stats" => {
            println!("{}", array.stats());
            Ok(())
        }
        "dump" => {
            let mut out = String::new();
            array
                .dump(&mut out)
                .map(|_| print!("{}", out))
                .map_err(|e| e.to_string())
        }
        "alloc" => {
            let count = match parts.next().map(str::parse::<u64>) {
                None => Ok(1),
                Some(Ok(n)) => Ok(n),
                Some(Err(e)) => Err(format!("invalid count: {}", e)),
            };
            count.and_then(|count| {
                let mut last = None;
                for _ in 0..count {
                    last = Some(array.allocate().map_err(|e| e.to_string())?);
                }
                if let Some(pos) = last {
                    println!(
                        "Allocated up to row {} (page {}, slot {})",
                        pos.row_id, pos.data_page_id, pos.slot
                    );
                }
                Ok(())
            })
        }
        "resolve" => parse_row_id(parts.next()).and_then(|row_id| {
            let pos = array.resolve(row_id).map_err(|e| e.to_string())?;
            println!("Row {} -> page {}, slot {}", pos.row_id, pos.data_page_id, pos.slot);
            Ok(())
        }),
        "read" => parse_row_id(parts.next()).and_then(|row_id| {
            let bytes = array.read_record_bytes(row_id).map_err(|e| e.to_string())?;
            let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            println!("{}", hex.join(" "));
            Ok(())
        }),
        "delete" => parse_row_id(parts.next()).and_then(|row_id| {
            array.delete(row_id).map_err(|e| e.to_string())?;
            println!("Row {} deleted", row_id);
            Ok(())
        }),
        "flush" => array.flush().map_err(|e| e.to_string()),
        other => Err(format!("Unknown command '{}', try 'help'", other)),
    };

    if let Err(message) = outcome {
        println!("Error: {}", message);
    }
    true
}

fn open_array(path: &str, data_size: usize, root: Option<PageId>) -> pagedarray::Result<Array> {
    let mut store = FilePageStore::open_or_create(path, StoreConfig::default())?;
    match root.or_else(|| store.root_page_id()) {
        Some(root) => PagedArray::open(store, root, data_size),
        None => {
            let mut array = PagedArray::create(store, data_size)?;
            let root = array.root_page_id();
            array.store_mut().set_root_page_id(root);
            array.store_mut().flush()?;
            Ok(array)
        }
    }
}

fn main() -> ExitCode {
    tracing_init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <file> <data-size> [root-page-id]", args[0]);
        return ExitCode::FAILURE;
    }
    let Ok(data_size) = args[2].parse::<usize>() else {
        eprintln!("invalid data size '{}'", args[2]);
        return ExitCode::FAILURE;
    };
    let root = match args.get(3).map(|s| s.parse::<PageId>()) {
        None => None,
        Some(Ok(root)) => Some(root),
        Some(Err(e)) => {
            eprintln!("invalid root page id: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut array = match open_array(&args[1], data_size, root) {
        Ok(array) => array,
        Err(e) => {
            eprintln!("Failed to open {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "{} ({} pages in file)",
        array.stats(),
        array.store().page_count()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to start line editor: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if command.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&command);
                if !process_command(&mut array, &command) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                if let Err(e) = array.flush() {
                    eprintln!("Flush failed: {}", e);
                }
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    ExitCode::SUCCESS
}

fn tracing_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
