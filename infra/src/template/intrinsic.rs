//! CloudFormation intrinsic functions

use serde_json::{json, Value};

/// `{"Ref": logical_id}`
#[must_use]
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
#[must_use]
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Sub": template}`
#[must_use]
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// `{"Fn::Join": [delimiter, parts]}`
#[must_use]
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{"Fn::ImportValue": export_name}`
#[must_use]
pub fn import_value(export_name: &str) -> Value {
    json!({ "Fn::ImportValue": export_name })
}

/// `{"Fn::Select": [index, list]}`
#[must_use]
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{"Fn::Split": [delimiter, source]}`
#[must_use]
pub fn split(delimiter: &str, source: Value) -> Value {
    json!({ "Fn::Split": [delimiter, source] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsics_render() {
        assert_eq!(reference("PhotoBucket"), json!({ "Ref": "PhotoBucket" }));
        assert_eq!(
            get_att("PhotoBucket", "Arn"),
            json!({ "Fn::GetAtt": ["PhotoBucket", "Arn"] })
        );
        assert_eq!(
            join("", vec![get_att("PhotoBucket", "Arn"), json!("/*")]),
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["PhotoBucket", "Arn"] }, "/*"]] })
        );
        assert_eq!(
            select(2, split("/", get_att("WebsiteBucket", "WebsiteURL"))),
            json!({
                "Fn::Select": [2, { "Fn::Split": ["/", { "Fn::GetAtt": ["WebsiteBucket", "WebsiteURL"] }] }]
            })
        );
        assert_eq!(
            import_value("SimpleAppDns-CertificateArn"),
            json!({ "Fn::ImportValue": "SimpleAppDns-CertificateArn" })
        );
    }
}
