//! 内置示例文档，启动时展示

use serde_json::{json, Value};

pub fn sample_data() -> Value {
    json!({
        "name": "John Doe",
        "age": 30,
        "contact": {
            "email": "john@example.com",
            "phone": "123-456-7890"
        },
        "address": {
            "street": "123 Main St",
            "city": "Anytown",
            "state": "CA",
            "zip": "12345"
        },
        "preferences": {
            "theme": "dark",
            "notifications": true
        },
        "misc": "Some other info",
        "active": true,
        "tags": ["premium", "customer", "verified"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field_paths::{default_selection, enumerate_fields};

    #[test]
    fn test_sample_default_selection() {
        let fields = enumerate_fields(&sample_data());
        assert_eq!(
            default_selection(&fields),
            vec!["active", "age", "city", "email", "misc"]
        );
        assert!(!fields.contains(&"tags".to_string()));
        assert!(!fields.contains(&"contact".to_string()));
    }
}
