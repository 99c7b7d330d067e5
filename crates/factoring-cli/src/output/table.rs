use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
///
/// Envelope results render field/value; item lists (origination outcomes,
/// batch outcomes, projection day records) render one row per element.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(outcomes)) = map.get("outcomes") {
                // Batch settlement output: one row per event.
                print_array_table(outcomes);
                print_counts(map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            // Origination results carry a per-item list; print the batch
            // header fields first, then the items as their own table.
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in res_map {
                if key == "items" {
                    continue;
                }
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));

            if let Some(Value::Array(items)) = res_map.get("items") {
                println!();
                print_array_table(items);
            }
        }
        _ => print_flat_object(&Value::Object(envelope.clone())),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_counts(map: &serde_json::Map<String, Value>) {
    if let (Some(processed), Some(failed)) = (map.get("processed"), map.get("failed")) {
        println!("\nProcessed: {}, failed: {}", processed, failed);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Rows may be ItemOutcome objects whose breakdown hides under "result";
    // flatten one level so the table stays readable.
    let rows: Vec<Value> = arr.iter().map(flatten_outcome).collect();

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in &rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in &rows {
            println!("{}", format_value(item));
        }
    }
}

fn flatten_outcome(item: &Value) -> Value {
    let Value::Object(map) = item else {
        return item.clone();
    };
    let Some(Value::Object(result)) = map.get("result") else {
        return item.clone();
    };

    let mut flat = serde_json::Map::new();
    for (key, val) in map {
        if key != "result" {
            flat.insert(key.clone(), val.clone());
        }
    }
    for (key, val) in result {
        flat.insert(key.clone(), val.clone());
    }
    Value::Object(flat)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
