//! Built-in functions installed into the global table at startup.
//!
//! Natives are plain function pointers behind [`Value::NativeFunction`]; they
//! receive already-evaluated arguments and report failures as bare messages,
//! which the call site wraps with the call's source line.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::value::Value;

/// Register every native under its global name.
pub fn install(globals: &mut HashMap<String, Value>) {
    info!("Installing native functions");

    let natives: &[(&'static str, usize, fn(&[Value]) -> Result<Value, String>)] = &[
        ("time", 0, native_time),
        ("type", 1, native_type),
        ("tonumber", 1, native_tonumber),
        ("input", 0, native_input),
    ];

    for &(name, arity, func) in natives {
        globals.insert(
            name.to_string(),
            Value::NativeFunction { name, arity, func },
        );
    }
}

/// Milliseconds since the Unix epoch, as a number.
fn native_time(_arguments: &[Value]) -> Result<Value, String> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| String::from("System clock is before the Unix epoch."))?;

    Ok(Value::Number(elapsed.as_millis() as f64))
}

/// The runtime type of the argument, as a string.
fn native_type(arguments: &[Value]) -> Result<Value, String> {
    Ok(Value::String(arguments[0].type_name().to_string()))
}

/// Parse a string into a number; numbers pass through, everything else is an
/// error.
fn native_tonumber(arguments: &[Value]) -> Result<Value, String> {
    match &arguments[0] {
        Value::Number(n) => Ok(Value::Number(*n)),

        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| format!("Can't convert '{}' to a number.", s)),

        other => Err(format!("Can't convert {} to a number.", other.type_name())),
    }
}

/// Read one line from stdin, without the trailing newline.
fn native_input(_arguments: &[Value]) -> Result<Value, String> {
    io::stdout()
        .flush()
        .map_err(|e| format!("Failed to flush stdout: {}.", e))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read from stdin: {}.", e))?;

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(Value::String(line))
}
