//! 执行结果观察
//!
//! 远程结果是不透明的 JSON，这里负责识别其形状、格式化给模型阅读，
//! 并判断是否值得生成图表

use serde_json::{json, Map, Value};

/// 图表摘要中展示的行数
const CHART_PREVIEW_ROWS: usize = 5;

/// 远程执行失败时写入 `data` 的负载
pub fn error_result(error: impl std::fmt::Display, sql: &str) -> Value {
    json!({
        "type": "error",
        "error": error.to_string(),
        "sql": sql,
    })
}

pub fn is_error(result: &Value) -> bool {
    result.get("type").and_then(Value::as_str) == Some("error")
}

/// 结果行，位于 `rows` 或 `data.rows`
pub fn result_rows(result: &Value) -> Option<&Vec<Value>> {
    result
        .get("rows")
        .or_else(|| result.get("data").and_then(|d| d.get("rows")))
        .and_then(Value::as_array)
}

fn row_to_line(row: &Value) -> String {
    match row {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// 将执行结果格式化为供模型阅读的文本
pub fn format_execution_result(result: &Value) -> String {
    if result.is_null() {
        return "No query result.".to_string();
    }

    if is_error(result) {
        let error = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return format!("Execution error: {}", error);
    }

    if let Some(rows) = result_rows(result) {
        return match rows.len() {
            0 => "Query succeeded, but no rows matched.".to_string(),
            1 => format!("Query succeeded, found 1 row:\n{}", pretty(&rows[0])),
            n => {
                let lines: Vec<String> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| format!("{}. {}", i + 1, row_to_line(row)))
                    .collect();
                format!("Query succeeded, found {} rows:\n{}", n, lines.join("\n"))
            }
        };
    }

    if let Some(affected) = result.get("affected_rows").and_then(Value::as_i64) {
        return format!("Statement executed, {} row(s) affected.", affected);
    }

    pretty(result)
}

fn is_chartable_number(key: &str, value: &Value) -> bool {
    value.is_number() && key != "id"
}

fn numeric_fields(row: &Map<String, Value>) -> Vec<&str> {
    row.iter()
        .filter(|(k, v)| is_chartable_number(k, v))
        .map(|(k, _)| k.as_str())
        .collect()
}

/// 至少两行且存在非 `id` 的数值列时才生成图表
pub fn should_generate_chart(result: &Value) -> bool {
    if result.is_null() || is_error(result) {
        return false;
    }

    match result_rows(result) {
        Some(rows) if rows.len() >= 2 => rows[0]
            .as_object()
            .map(|first| !numeric_fields(first).is_empty())
            .unwrap_or(false),
        _ => false,
    }
}

/// 为图表步骤准备的数据摘要
pub fn prepare_chart_data(result: &Value) -> String {
    let Some(rows) = result_rows(result) else {
        return "No rows available.".to_string();
    };
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return "Empty result.".to_string();
    };

    let numeric = numeric_fields(first);
    let text: Vec<&str> = first
        .iter()
        .filter(|(k, v)| v.is_string() && k.as_str() != "id")
        .map(|(k, _)| k.as_str())
        .collect();
    let list_or_none = |fields: &[&str]| {
        if fields.is_empty() {
            "none".to_string()
        } else {
            fields.join(", ")
        }
    };

    let mut summary = format!(
        "Data summary:\n\
         - rows: {}\n\
         - columns: {}\n\
         - numeric columns: {}\n\
         - text columns: {}\n\n\
         First {} rows:\n",
        rows.len(),
        first.len(),
        list_or_none(&numeric),
        list_or_none(&text),
        CHART_PREVIEW_ROWS,
    );

    for (i, row) in rows.iter().take(CHART_PREVIEW_ROWS).enumerate() {
        summary.push_str(&format!("{}. {}\n", i + 1, row_to_line(row)));
    }
    if rows.len() > CHART_PREVIEW_ROWS {
        summary.push_str(&format!("... {} more rows", rows.len() - CHART_PREVIEW_ROWS));
    }

    summary
}

/// 保证响应中的 `data` 是 JSON 对象
pub fn into_data_object(result: Value) -> Map<String, Value> {
    match result {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("rows".to_string(), other);
            map
        }
    }
}
