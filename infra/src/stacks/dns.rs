//! Hosted zone and certificate for the custom domain

use serde_json::{json, Value};

use crate::template::{
    intrinsic::{import_value, reference},
    Output, Resource, Template, TemplateError,
};

const HOSTED_ZONE_ID: &str = "HostedZone";
const CERTIFICATE_ID: &str = "Certificate";

/// Domain resources consumed by the application stack
///
/// The values are `Fn::ImportValue`s of this stack's exports, so the DNS
/// stack must be deployed first.
#[derive(Debug, Clone, PartialEq)]
pub struct DnsBinding {
    /// Apex domain name
    pub domain_name: String,
    /// Hosted zone id of the apex zone
    pub hosted_zone_id: Value,
    /// ARN of the DNS-validated certificate
    pub certificate_arn: Value,
    /// Stack producing the values
    pub stack_name: String,
}

/// Public hosted zone plus a DNS-validated certificate for one apex domain
#[derive(Debug, Clone)]
pub struct DnsStack {
    name: String,
    domain_name: String,
}

impl DnsStack {
    /// Creates the stack definition
    #[must_use]
    pub fn new(name: &str, domain_name: &str) -> Self {
        Self {
            name: name.to_string(),
            domain_name: domain_name.to_string(),
        }
    }

    /// Stack name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn hosted_zone_export(&self) -> String {
        format!("{}-HostedZoneId", self.name)
    }

    fn certificate_export(&self) -> String {
        format!("{}-CertificateArn", self.name)
    }

    /// Handle for importing this stack's outputs elsewhere
    #[must_use]
    pub fn binding(&self) -> DnsBinding {
        DnsBinding {
            domain_name: self.domain_name.clone(),
            hosted_zone_id: import_value(&self.hosted_zone_export()),
            certificate_arn: import_value(&self.certificate_export()),
            stack_name: self.name.clone(),
        }
    }

    /// Renders the stack's template
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the template cannot be assembled
    pub fn synthesize(&self) -> Result<Template, TemplateError> {
        let mut template = Template::new(&format!(
            "Hosted zone and certificate for {}",
            self.domain_name
        ));

        template.add_resource(
            HOSTED_ZONE_ID,
            Resource::new(
                "AWS::Route53::HostedZone",
                json!({ "Name": format!("{}.", self.domain_name) }),
            ),
        )?;

        template.add_resource(
            CERTIFICATE_ID,
            Resource::new(
                "AWS::CertificateManager::Certificate",
                json!({
                    "DomainName": self.domain_name,
                    "ValidationMethod": "DNS",
                    "DomainValidationOptions": [{
                        "DomainName": self.domain_name,
                        "HostedZoneId": reference(HOSTED_ZONE_ID),
                    }],
                }),
            ),
        )?;

        template.add_output(
            "HostedZoneId",
            Output::exported(
                reference(HOSTED_ZONE_ID),
                "Hosted zone of the apex domain",
                &self.hosted_zone_export(),
            ),
        )?;

        template.add_output(
            "CertificateArn",
            Output::exported(
                reference(CERTIFICATE_ID),
                "Certificate for the apex domain",
                &self.certificate_export(),
            ),
        )?;

        Ok(template)
    }
}
