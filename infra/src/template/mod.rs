//! Typed CloudFormation template model
//!
//! Resources, parameters and outputs are kept in sorted maps so a given
//! stack definition always renders to the same bytes.

pub mod intrinsic;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const FORMAT_VERSION: &str = "2010-09-09";

/// Errors raised while assembling a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Two entries share a logical id
    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    /// Logical ids must be non-empty and alphanumeric
    #[error("Invalid logical id: {0:?}")]
    InvalidLogicalId(String),
}

/// What happens to a resource when it leaves the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    /// Keep the physical resource
    Retain,
    /// Delete the physical resource
    Delete,
}

/// One `Resources` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    /// CloudFormation resource type, e.g. `AWS::S3::Bucket`
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Resource properties
    pub properties: Value,
    /// Logical ids this resource must be created after
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Policy applied on stack deletion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
    /// Policy applied when an update replaces the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<DeletionPolicy>,
}

impl Resource {
    /// Creates a resource of `resource_type` with `properties`
    #[must_use]
    pub fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Adds an explicit creation-order dependency
    #[must_use]
    pub fn depends_on(mut self, logical_id: &str) -> Self {
        self.depends_on.push(logical_id.to_string());
        self
    }

    /// Sets both the deletion and update-replace policy
    #[must_use]
    pub const fn removal_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

/// One `Parameters` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Parameter type, e.g. `String`
    #[serde(rename = "Type")]
    pub parameter_type: String,
    /// Operator-facing description
    pub description: String,
}

impl Parameter {
    /// A `String` parameter
    #[must_use]
    pub fn string(description: &str) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: description.to_string(),
        }
    }
}

/// Cross-stack export of an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    /// Region-unique export name
    pub name: String,
}

/// One `Outputs` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// Output value
    pub value: Value,
    /// Operator-facing description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Export making the value importable by other stacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

impl Output {
    /// An output exported under `export_name`
    #[must_use]
    pub fn exported(value: Value, description: &str, export_name: &str) -> Self {
        Self {
            value,
            description: Some(description.to_string()),
            export: Some(Export {
                name: export_name.to_string(),
            }),
        }
    }
}

/// A CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: &'static str,
    description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Parameter>,
    resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Template {
    /// Creates an empty template
    #[must_use]
    pub fn new(description: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            description: description.to_string(),
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Adds a parameter
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the logical id is invalid or already taken
    pub fn add_parameter(
        &mut self,
        logical_id: &str,
        parameter: Parameter,
    ) -> Result<(), TemplateError> {
        self.check_logical_id(logical_id)?;
        self.parameters.insert(logical_id.to_string(), parameter);
        Ok(())
    }

    /// Adds a resource
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the logical id is invalid or already taken
    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) -> Result<(), TemplateError> {
        self.check_logical_id(logical_id)?;
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    /// Adds an output
    ///
    /// Outputs live in their own namespace, separate from resources.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the logical id is invalid or already taken
    pub fn add_output(&mut self, logical_id: &str, output: Output) -> Result<(), TemplateError> {
        validate_logical_id(logical_id)?;
        if self.outputs.contains_key(logical_id) {
            return Err(TemplateError::DuplicateLogicalId(logical_id.to_string()));
        }
        self.outputs.insert(logical_id.to_string(), output);
        Ok(())
    }

    fn check_logical_id(&self, logical_id: &str) -> Result<(), TemplateError> {
        validate_logical_id(logical_id)?;
        if self.resources.contains_key(logical_id) || self.parameters.contains_key(logical_id) {
            return Err(TemplateError::DuplicateLogicalId(logical_id.to_string()));
        }
        Ok(())
    }

    /// Looks up a resource by logical id
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources of the given type, keyed by logical id
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.resource_type == resource_type)
            .map(|(id, resource)| (id.as_str(), resource))
    }

    /// Looks up an output by logical id
    #[must_use]
    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        self.outputs.get(logical_id)
    }

    /// Looks up a parameter by logical id
    #[must_use]
    pub fn parameter(&self, logical_id: &str) -> Option<&Parameter> {
        self.parameters.get(logical_id)
    }

    /// Renders the template as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn validate_logical_id(logical_id: &str) -> Result<(), TemplateError> {
    if logical_id.is_empty() || !logical_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TemplateError::InvalidLogicalId(logical_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_duplicate_resource_is_rejected() {
        let mut template = Template::new("test");
        template
            .add_resource("Bucket", Resource::new("AWS::S3::Bucket", json!({})))
            .unwrap();

        let result = template.add_resource("Bucket", Resource::new("AWS::S3::Bucket", json!({})));

        assert_eq!(
            result,
            Err(TemplateError::DuplicateLogicalId("Bucket".to_string()))
        );
    }

    #[test]
    fn test_parameter_and_resource_share_namespace() {
        let mut template = Template::new("test");
        template
            .add_parameter("CodeBucket", Parameter::string("code"))
            .unwrap();

        let result =
            template.add_resource("CodeBucket", Resource::new("AWS::S3::Bucket", json!({})));

        assert!(matches!(result, Err(TemplateError::DuplicateLogicalId(_))));
    }

    #[test]
    fn test_invalid_logical_ids() {
        let mut template = Template::new("test");
        for id in ["", "Photo-Bucket", "photo bucket", "Photo_Bucket"] {
            assert_eq!(
                template.add_resource(id, Resource::new("AWS::S3::Bucket", json!({}))),
                Err(TemplateError::InvalidLogicalId(id.to_string()))
            );
        }
    }

    #[test]
    fn test_template_rendering() {
        let mut template = Template::new("photo storage");
        template
            .add_resource(
                "PhotoBucket",
                Resource::new("AWS::S3::Bucket", json!({}))
                    .removal_policy(DeletionPolicy::Retain),
            )
            .unwrap();
        template
            .add_resource(
                "PhotoBucketPolicy",
                Resource::new("AWS::S3::BucketPolicy", json!({ "Bucket": "x" }))
                    .depends_on("PhotoBucket"),
            )
            .unwrap();
        template
            .add_output(
                "PhotoBucketName",
                Output::exported(json!("x"), "bucket", "PhotoBucket"),
            )
            .unwrap();

        let rendered: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();

        assert_eq!(rendered["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(rendered["Description"], "photo storage");
        assert!(rendered.get("Parameters").is_none());
        assert_eq!(
            rendered["Resources"]["PhotoBucket"],
            json!({
                "Type": "AWS::S3::Bucket",
                "Properties": {},
                "DeletionPolicy": "Retain",
                "UpdateReplacePolicy": "Retain"
            })
        );
        assert_eq!(
            rendered["Resources"]["PhotoBucketPolicy"]["DependsOn"],
            json!(["PhotoBucket"])
        );
        assert_eq!(
            rendered["Outputs"]["PhotoBucketName"],
            json!({ "Value": "x", "Description": "bucket", "Export": { "Name": "PhotoBucket" } })
        );
    }
}
