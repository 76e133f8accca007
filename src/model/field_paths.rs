//! 可选字段枚举：遍历 JSON 树，收集可供勾选的键名（去重、排序）

use std::collections::BTreeSet;

use serde_json::Value;

/// 默认勾选的字段数
pub const DEFAULT_SELECTION_LEN: usize = 5;

/// 收集全树中值为标量的键名，按字典序去重
///
/// 值为对象或数组的键本身不会出现，只递归进入其内容；
/// 因此一个嵌套记录（如 `contact`）只提供其子键（`email`、`phone`）。
/// 数组元素中的对象同样会被遍历，但数组下标从不作为键输出。
///
/// 注意：提取器不进入数组，所以只出现在数组元素里的键虽可勾选，却不会产生输出。
pub fn enumerate_fields(root: &Value) -> Vec<String> {
    fn walk(v: &Value, out: &mut BTreeSet<String>) {
        match v {
            Value::Object(map) => {
                for (key, child) in map {
                    if !(child.is_object() || child.is_array()) {
                        out.insert(key.clone());
                    }
                    walk(child, out);
                }
            }
            Value::Array(arr) => {
                for child in arr {
                    walk(child, out);
                }
            }
            _ => {}
        }
    }

    let mut out = BTreeSet::new();
    walk(root, &mut out);
    out.into_iter().collect()
}

/// 数据源变化时的默认勾选：排序后的前五个字段
pub fn default_selection(fields: &[String]) -> Vec<String> {
    fields.iter().take(DEFAULT_SELECTION_LEN).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_like_document() {
        let data = json!({
            "name": "John Doe",
            "age": 30,
            "contact": {"email": "john@example.com", "phone": "123-456-7890"},
            "tags": ["premium", "customer"]
        });
        assert_eq!(enumerate_fields(&data), vec!["age", "email", "name", "phone"]);
    }

    #[test]
    fn test_object_valued_keys_are_not_offered() {
        let data = json!({"user": {"profile": {"bio": "x"}}});
        assert_eq!(enumerate_fields(&data), vec!["bio"]);
    }

    #[test]
    fn test_array_elements_are_traversed_without_indices() {
        let data = json!({"items": [{"id": 1}, {"id": 2, "label": "b"}, [{"deep": true}], "loose"]});
        assert_eq!(enumerate_fields(&data), vec!["deep", "id", "label"]);
    }

    #[test]
    fn test_sorted_and_unique() {
        let data = json!({
            "zeta": 1,
            "alpha": {"zeta": 2, "beta": null},
            "gamma": {"alpha": "scalar here"}
        });
        let fields = enumerate_fields(&data);
        assert_eq!(fields, vec!["alpha", "beta", "zeta"]);
        let mut sorted = fields.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(fields, sorted);
    }

    #[test]
    fn test_scalar_and_empty_roots() {
        assert!(enumerate_fields(&json!(42)).is_empty());
        assert!(enumerate_fields(&json!({})).is_empty());
        assert!(enumerate_fields(&json!([])).is_empty());
    }

    #[test]
    fn test_default_selection_takes_first_five() {
        let fields: Vec<String> = ["a", "b", "c", "d", "e", "f", "g"].iter().map(|s| s.to_string()).collect();
        assert_eq!(default_selection(&fields), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(default_selection(&fields[..2]), vec!["a", "b"]);
    }
}
