//! 字段提取：按目标键名收集 (key, value)，并格式化为 `key: value` 行

use serde_json::Value;

/// 一次命中的键值对；同名键出现在多处时全部保留
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPair {
    pub key: String,
    pub value: Value,
}

/// 按文档顺序（先序深度优先）收集键名属于 targets 的键值对
///
/// 值原样保留，不展开。只递归进入对象；数组整体不透明，
/// 数组元素里的对象即使含有目标键也不会命中。根节点不是对象时结果为空。
pub fn extract_fields<S: AsRef<str>>(root: &Value, targets: &[S]) -> Vec<ExtractedPair> {
    fn walk<S: AsRef<str>>(v: &Value, targets: &[S], out: &mut Vec<ExtractedPair>) {
        let Value::Object(map) = v else {
            return;
        };
        for (key, child) in map {
            if targets.iter().any(|t| t.as_ref() == key) {
                out.push(ExtractedPair {
                    key: key.clone(),
                    value: child.clone(),
                });
            }
            if child.is_object() {
                walk(child, targets, out);
            }
        }
    }

    let mut out = Vec::new();
    if !targets.is_empty() {
        walk(root, targets, &mut out);
    }
    out
}

/// 标量取自然字符串形式，对象/数组输出紧凑 JSON
pub fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(_) | Value::Array(_) => v.to_string(),
    }
}

/// 每个键值对一行，换行连接，末尾无换行
pub fn format_extracted_fields(pairs: &[ExtractedPair]) -> String {
    pairs
        .iter()
        .map(|p| format!("{}: {}", p.key, render_value(&p.value)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(key: &str, value: Value) -> ExtractedPair {
        ExtractedPair {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_nested_scenario() {
        let data = json!({"a": "x", "b": {"c": "y"}});
        let pairs = extract_fields(&data, &["a", "c"]);
        assert_eq!(pairs, vec![pair("a", json!("x")), pair("c", json!("y"))]);
        assert_eq!(format_extracted_fields(&pairs), "a: x\nc: y");
    }

    #[test]
    fn test_array_is_opaque() {
        let data = json!({"a": ["x", {"c": "y"}]});
        assert!(extract_fields(&data, &["c"]).is_empty());
    }

    #[test]
    fn test_array_value_itself_can_match() {
        let data = json!({"tags": ["premium", "customer"], "items": [{"tags": "inner"}]});
        let pairs = extract_fields(&data, &["tags"]);
        assert_eq!(pairs, vec![pair("tags", json!(["premium", "customer"]))]);
        assert_eq!(format_extracted_fields(&pairs), r#"tags: ["premium","customer"]"#);
    }

    #[test]
    fn test_object_value_kept_verbatim_and_descended() {
        let data = json!({"contact": {"email": "john@example.com", "contact": 1}});
        let pairs = extract_fields(&data, &["contact"]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].value, json!({"email": "john@example.com", "contact": 1}));
        assert_eq!(pairs[1].value, json!(1));
    }

    #[test]
    fn test_duplicate_keys_collected_in_document_order() {
        let data = json!({
            "name": "outer",
            "child": {"name": "inner", "deeper": {"name": "deepest"}},
            "sibling": {"name": "last"}
        });
        let values: Vec<Value> = extract_fields(&data, &["name"]).into_iter().map(|p| p.value).collect();
        assert_eq!(values, vec![json!("outer"), json!("inner"), json!("deepest"), json!("last")]);
    }

    #[test]
    fn test_empty_targets_and_non_object_root() {
        let data = json!({"a": 1});
        let none: [&str; 0] = [];
        assert!(extract_fields(&data, &none).is_empty());
        assert!(extract_fields(&json!([{"a": 1}]), &["a"]).is_empty());
        assert!(extract_fields(&json!("a"), &["a"]).is_empty());
        assert!(extract_fields(&Value::Null, &["a"]).is_empty());
    }

    #[test]
    fn test_duplicate_targets_do_not_duplicate_matches() {
        let data = json!({"a": 1});
        assert_eq!(extract_fields(&data, &["a", "a"]).len(), 1);
    }

    #[test]
    fn test_scalar_rendering() {
        let pairs = vec![
            pair("age", json!(30)),
            pair("active", json!(true)),
            pair("nothing", Value::Null),
            pair("price", json!(9.5)),
            pair("name", json!("John Doe")),
        ];
        let text = format_extracted_fields(&pairs);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(
            lines,
            vec!["age: 30", "active: true", "nothing: null", "price: 9.5", "name: John Doe"]
        );
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_extracted_fields(&[]), "");
    }

    #[test]
    fn test_string_targets() {
        let data = json!({"city": "Anytown"});
        let targets = vec!["city".to_string()];
        assert_eq!(format_extracted_fields(&extract_fields(&data, &targets)), "city: Anytown");
    }
}
