//! Simple command that prints one or '-n count' snowflake ids, or decodes one given with '-d id'

use std::{env, io, io::Write, process::ExitCode};

use snowgen::{SnowflakeId, DEFAULT_EPOCH_OFFSET_MS};

enum Command {
    Generate(usize),
    Decode(SnowflakeId),
}

fn main() -> io::Result<ExitCode> {
    let command = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-n count | -d id]",
                    program.as_deref().unwrap_or("snowgen")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    match command {
        Command::Generate(count) => {
            for _ in 0..count {
                match snowgen::generate_unique_id() {
                    Ok(id) => writeln!(buf, "{}", id)?,
                    Err(err) => {
                        buf.flush()?;
                        eprintln!("Error: {}", err);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Command::Decode(id) => {
            let (elapsed_ms, machine_id, process_id, sequence) = id.to_fields();
            writeln!(buf, "unix_ts_ms: {}", id.timestamp_ms(DEFAULT_EPOCH_OFFSET_MS))?;
            writeln!(buf, "elapsed_ms: {}", elapsed_ms)?;
            writeln!(buf, "machine_id: {}", machine_id)?;
            writeln!(buf, "process_id: {}", process_id)?;
            writeln!(buf, "sequence:   {}", sequence)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut command = None;
    while let Some(arg) = args.next() {
        if arg != "-n" && arg != "-d" {
            return Err(format!("unrecognized argument '{}'", arg));
        }
        if command.is_some() {
            return Err("only one of '-n' and '-d' may be given, once".to_owned());
        }
        let Some(value) = args.next() else {
            return Err(format!("argument to option '{}' missing", &arg[1..]));
        };
        command = Some(if arg == "-n" {
            let Ok(c) = value.parse() else {
                return Err(format!("invalid argument to option 'n': '{}'", value));
            };
            Command::Generate(c)
        } else {
            let Ok(id) = value.parse() else {
                return Err(format!("invalid argument to option 'd': '{}'", value));
            };
            Command::Decode(id)
        });
    }
    Ok(command.unwrap_or(Command::Generate(1)))
}
