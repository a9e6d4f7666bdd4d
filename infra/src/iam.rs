//! IAM policy documents

use serde::Serialize;
use serde_json::{json, Value};

const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grants the listed actions
    Allow,
    /// Denies the listed actions
    Deny,
}

/// One IAM policy statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Allow or deny
    pub effect: Effect,
    /// Principal the statement applies to (resource and trust policies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    /// Actions, e.g. `s3:GetObject`
    pub action: Vec<String>,
    /// Resource ARNs; absent in trust policies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Value>,
}

impl PolicyStatement {
    /// An empty `Allow` statement
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: Vec::new(),
            resource: Vec::new(),
        }
    }

    /// Adds actions
    #[must_use]
    pub fn actions(mut self, actions: &[&str]) -> Self {
        self.action
            .extend(actions.iter().map(ToString::to_string));
        self
    }

    /// Adds a resource ARN (literal or intrinsic)
    #[must_use]
    pub fn resource(mut self, resource: Value) -> Self {
        self.resource.push(resource);
        self
    }

    /// Restricts the statement to an AWS service principal
    #[must_use]
    pub fn service_principal(mut self, service: &str) -> Self {
        self.principal = Some(json!({ "Service": service }));
        self
    }

    /// Allows everyone
    #[must_use]
    pub fn any_principal(mut self) -> Self {
        self.principal = Some(json!("*"));
        self
    }
}

/// An IAM policy document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    version: &'static str,
    /// Statements, evaluated together
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// A document holding `statements`
    #[must_use]
    pub const fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: statements,
        }
    }

    /// Renders the document for use as a resource property
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
