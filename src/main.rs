use lembar::{
    storage::{
        DEFAULT_CACHE_CAPACITY, DEFAULT_ELEMENT_COUNT, DEFAULT_FILENAME,
        DEFAULT_PAGE_BYTE_CAPACITY, storage_manager::StorageManager,
    },
    types::element::ElementKind,
};
use rustyline::{DefaultEditor, error::ReadlineError};

enum Input<T> {
    Value(T),
    Default,
    Exit,
}

fn read_long(rl: &mut DefaultEditor, prompt: &str) -> Input<i64> {
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Input::Default;
                }
                match trimmed.parse::<i64>() {
                    Ok(value) => {
                        let _ = rl.add_history_entry(trimmed);
                        return Input::Value(value);
                    }
                    Err(_) => println!("Please enter a whole number"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Input::Exit,
            Err(err) => {
                println!("Input error: {:?}", err);
                return Input::Exit;
            }
        }
    }
}

fn read_string(rl: &mut DefaultEditor, prompt: &str) -> Input<String> {
    match rl.readline(prompt) {
        Ok(line) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                Input::Default
            } else {
                Input::Value(trimmed)
            }
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Input::Exit,
        Err(_) => Input::Exit,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("LEMBAR paged storage");
    println!(
        "Defaults: array length {}, file '{}', cache {} pages, page size {} bytes",
        DEFAULT_ELEMENT_COUNT, DEFAULT_FILENAME, DEFAULT_CACHE_CAPACITY, DEFAULT_PAGE_BYTE_CAPACITY
    );

    let mut rl = DefaultEditor::new()?;

    let mut element_count = DEFAULT_ELEMENT_COUNT;
    let mut filename = DEFAULT_FILENAME.to_string();
    let mut cache_capacity = DEFAULT_CACHE_CAPACITY;
    let mut page_byte_capacity = DEFAULT_PAGE_BYTE_CAPACITY;

    let use_defaults = loop {
        match rl.readline("Use default values? (y/n): ") {
            Ok(line) => match line.trim() {
                "y" => break true,
                "n" => break false,
                _ => continue,
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    };

    if !use_defaults {
        loop {
            match read_long(&mut rl, "Array length (Enter - keep default): ") {
                Input::Value(value) if value > 0 => {
                    element_count = value as u64;
                    break;
                }
                Input::Value(_) => println!("Length must be positive"),
                Input::Default => break,
                Input::Exit => return Ok(()),
            }
        }
        match read_string(&mut rl, "File name (Enter - keep default): ") {
            Input::Value(value) => filename = value,
            Input::Default => {}
            Input::Exit => return Ok(()),
        }
        loop {
            match read_long(&mut rl, "Cache capacity in pages (Enter - keep default): ") {
                Input::Value(value) if value > 0 => {
                    cache_capacity = value as usize;
                    break;
                }
                Input::Value(_) => println!("Cache capacity must be positive"),
                Input::Default => break,
                Input::Exit => return Ok(()),
            }
        }
        loop {
            match read_long(&mut rl, "Page size in bytes (Enter - keep default): ") {
                Input::Value(value) if value >= 4 => {
                    page_byte_capacity = value as usize;
                    break;
                }
                Input::Value(_) => println!("Page size must be at least the element width"),
                Input::Default => break,
                Input::Exit => return Ok(()),
            }
        }
    }

    println!();
    println!("================================================================");
    println!("Using:");
    println!("  - array length  = {}", element_count);
    println!("  - file name     = {}", filename);
    println!("  - cache         = {} pages", cache_capacity);
    println!("  - page size     = {} bytes", page_byte_capacity);
    println!();

    let mut storage = StorageManager::open(
        &filename,
        ElementKind::Int32,
        element_count,
        cache_capacity,
        page_byte_capacity,
    )?;
    println!("File opened/created");

    loop {
        println!();
        println!("Write to a chosen element (Enter on any prompt - quit)");

        let index = match read_long(&mut rl, "Element index: ") {
            Input::Value(value) if value >= 0 && (value as u64) < element_count => value,
            Input::Value(_) => {
                println!("Index must be in [0, {})", element_count);
                continue;
            }
            Input::Default | Input::Exit => break,
        };

        let value = match read_long(&mut rl, "Element value: ") {
            Input::Value(value) if value >= i32::MIN as i64 && value <= i32::MAX as i64 => value,
            Input::Value(_) => {
                println!("Value must fit a 32-bit integer");
                continue;
            }
            Input::Default | Input::Exit => break,
        };

        let previous = storage.read_element(index)?;
        println!("Value before write: {}", previous);

        storage.write_element(index, value)?;
        let actual = storage.read_element(index)?;
        println!("Value read back: {}", actual);
    }

    storage.close()?;
    println!();
    println!("Done");
    Ok(())
}
