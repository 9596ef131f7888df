//! 提示词构建
//!
//! 每个工作流步骤的系统提示词，以及从模型输出中提取 SQL

use serde_json::{Map, Value};

/// 各步骤提示词的首行角色声明，模拟模型据此区分步骤
pub const REASON_ROLE: &str = "You are a SQL query analysis expert.";
pub const SQL_ROLE: &str = "You are a SQL generation expert.";
pub const OBSERVE_ROLE: &str = "You are a data analysis expert.";
pub const CHART_ROLE: &str = "You are a data visualization expert.";

/// 将远程返回的数据库结构渲染为文本
///
/// 兼容两种形状：以表名为键的对象，或 `{name, columns}` 列表；
/// 两者都可以直接给出，也可以包在 `tables` 字段里。
pub fn render_schema(schema: &Value) -> String {
    let tables = schema.get("tables").unwrap_or(schema);
    let mut lines = Vec::new();

    match tables {
        Value::Object(map) => {
            for (name, table) in map.iter().filter(|(_, t)| t.is_object()) {
                push_table(&mut lines, name, table);
            }
        }
        Value::Array(items) => {
            for table in items {
                let name = table.get("name").and_then(Value::as_str).unwrap_or_default();
                push_table(&mut lines, name, table);
            }
        }
        _ => {}
    }

    lines.join("\n")
}

fn push_table(lines: &mut Vec<String>, name: &str, table: &Value) {
    lines.push(format!("Table: {}", name));
    if let Some(columns) = table.get("columns").and_then(Value::as_array) {
        for col in columns {
            let col_name = col.get("name").and_then(Value::as_str).unwrap_or_default();
            let col_type = col.get("type").and_then(Value::as_str).unwrap_or_default();
            lines.push(format!("  - {} ({})", col_name, col_type));
        }
    }
    lines.push(String::new());
}

/// 意图分析提示词
pub fn reason_prompt(query: &str, schema: &str, context: &Map<String, Value>) -> String {
    let mut prompt = format!(
        "{REASON_ROLE} Analyse the user's natural-language query and work out its intent.\n\n\
         Database schema:\n{schema}\n\n\
         Query to analyse:\n\"{query}\"\n"
    );

    if !context.is_empty() {
        let context = serde_json::to_string_pretty(context).unwrap_or_default();
        prompt.push_str(&format!("\nAdditional context supplied by the caller:\n{}\n", context));
    }

    prompt.push_str(
        "\nProvide:\n\
         1. The query type (SELECT, INSERT, UPDATE, DELETE, aggregation, ...)\n\
         2. The tables involved\n\
         3. The filter conditions\n\
         4. The expected shape of the result",
    );
    prompt
}

/// SQL 生成提示词
pub fn sql_prompt(query: &str, schema: &str, reasoning: &str) -> String {
    format!(
        "{SQL_ROLE} Using the user's query and the analysis below, write the matching SQL.\n\n\
         Database schema:\n{schema}\n\n\
         User query: {query}\n\
         Analysis: {reasoning}\n\n\
         Return a single SQL statement only, without any explanation."
    )
}

/// 结果解读提示词
pub fn observe_prompt(query: &str, reasoning: &str, sql: &str, formatted_result: &str) -> String {
    format!(
        "{OBSERVE_ROLE} Explain the SQL result to the user clearly.\n\n\
         Original query: {query}\n\
         Analysis: {reasoning}\n\
         Executed SQL: {sql}\n\
         Result: {formatted_result}\n\n\
         Provide:\n\
         1. A short summary of the outcome\n\
         2. A natural-language description of the data, using a numbered list (1. 2. 3.) for multiple rows\n\
         3. If there was an error, explain it and suggest a fix\n\
         4. A professional but friendly tone"
    )
}

/// 图表建议提示词
pub fn chart_prompt(query: &str, chart_data: &str) -> String {
    format!(
        "{CHART_ROLE} Suggest a chart for the data below.\n\n\
         User query: {query}\n\
         Data: {chart_data}\n\n\
         Provide the chart type, title and axis labels, colour suggestions, key insights, \
         and chart code in Mermaid syntax. Answer in this format:\n\
         ## Chart suggestion\n[chart type]\n\n\
         ## Chart code (Mermaid)\n```mermaid\n[code]\n```\n\n\
         ## Key insights\n[insights]"
    )
}

/// 去掉模型输出外层的 markdown 代码围栏
pub fn extract_sql(llm_response: &str) -> String {
    let mut sql = llm_response.trim();

    if let Some(rest) = sql.strip_prefix("```sql") {
        sql = rest;
    } else if let Some(rest) = sql.strip_prefix("```") {
        sql = rest;
    }
    if let Some(rest) = sql.strip_suffix("```") {
        sql = rest;
    }

    sql.trim().to_string()
}
