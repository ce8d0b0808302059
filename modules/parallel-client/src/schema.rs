use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// JSON schema for `T` in the shape the task API accepts: a single inlined
/// object schema with `additionalProperties: false` on every object.
pub fn json_schema_for<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("title");
            map.remove("definitions")
        }
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    close_objects(&mut value);

    value
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                let name = ref_path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(name) {
                    let mut resolved = def.clone();
                    inline_refs(&mut resolved, definitions);
                    map.remove("$ref");
                    if let Value::Object(def_map) = resolved {
                        for (k, v) in def_map {
                            map.entry(k).or_insert(v);
                        }
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                close_objects(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    enum Mood {
        Calm,
        Loud,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Probe {
        /// Score from 1-10
        score: f64,
        mood: Mood,
        notes: Vec<String>,
    }

    #[test]
    fn nested_enums_are_inlined() {
        let schema = json_schema_for::<Probe>();
        let text = schema.to_string();

        assert!(!text.contains("$ref"), "refs should be inlined: {text}");
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["properties"]["mood"]["enum"][0], "Calm");
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn doc_comments_become_descriptions() {
        let schema = json_schema_for::<Probe>();
        assert_eq!(schema["properties"]["score"]["description"], "Score from 1-10");
    }
}
