//! Application stack: buckets, listing function, HTTP API and distribution

use serde_json::{json, Value};

use super::DnsBinding;
use crate::{
    config::{AppConfig, FunctionConfig},
    iam::{PolicyDocument, PolicyStatement},
    template::{
        intrinsic::{get_att, join, reference, select, split, sub},
        DeletionPolicy, Output, Parameter, Resource, Template, TemplateError,
    },
};

/// Logical ids of the application stack's resources
pub mod ids {
    /// Bucket holding the photos
    pub const PHOTO_BUCKET: &str = "PhotoBucket";
    /// Public bucket serving the frontend bundle
    pub const WEBSITE_BUCKET: &str = "WebsiteBucket";
    /// Public-read policy of the website bucket
    pub const WEBSITE_BUCKET_POLICY: &str = "WebsiteBucketPolicy";
    /// Execution role of the listing function
    pub const FUNCTION_ROLE: &str = "GetPhotosFunctionRole";
    /// Bucket permissions of the listing function
    pub const FUNCTION_ROLE_POLICY: &str = "GetPhotosFunctionRolePolicy";
    /// Listing function
    pub const FUNCTION: &str = "GetPhotosFunction";
    /// HTTP API
    pub const HTTP_API: &str = "PhotoHttpApi";
    /// Auto-deployed default stage
    pub const HTTP_API_STAGE: &str = "PhotoHttpApiDefaultStage";
    /// Lambda proxy integration
    pub const INTEGRATION: &str = "GetPhotosIntegration";
    /// `GET /getPhotos` route
    pub const ROUTE: &str = "GetPhotosRoute";
    /// API Gateway invoke permission on the function
    pub const INVOKE_PERMISSION: &str = "GetPhotosInvokePermission";
    /// CloudFront distribution
    pub const DISTRIBUTION: &str = "WebsiteDistribution";
    /// Apex alias record, custom domain only
    pub const ALIAS_RECORD: &str = "WebsiteAliasRecord";
    /// Code bucket parameter, when no code location is configured
    pub const CODE_BUCKET_PARAMETER: &str = "GetPhotosCodeBucket";
    /// Code key parameter, when no code location is configured
    pub const CODE_KEY_PARAMETER: &str = "GetPhotosCodeKey";
}

/// Route key of the listing route
pub const GET_PHOTOS_ROUTE_KEY: &str = "GET /getPhotos";

/// HTTP API name
pub const API_NAME: &str = "photo-api";

// Hosted zone id for every CloudFront alias target
const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";
// Managed `CachingOptimized` cache policy
const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// The function's S3 permissions: `ListBucket` on the bucket and
/// `GetObject`/`PutObject` on its objects, nothing else
#[must_use]
pub fn photo_bucket_statements(bucket_arn: &Value) -> Vec<PolicyStatement> {
    vec![
        PolicyStatement::allow()
            .actions(&["s3:ListBucket"])
            .resource(bucket_arn.clone()),
        PolicyStatement::allow()
            .actions(&["s3:GetObject", "s3:PutObject"])
            .resource(join("", vec![bucket_arn.clone(), json!("/*")])),
    ]
}

/// Everything the application stack provisions
#[derive(Debug, Clone)]
pub struct AppStack {
    name: String,
    export_prefix: String,
    retain_buckets: bool,
    function: FunctionConfig,
    domain: Option<DnsBinding>,
}

impl AppStack {
    /// Creates the stack definition from configuration
    ///
    /// `domain` comes from [`super::DnsStack::binding`]; without it the
    /// distribution keeps its generated domain name.
    #[must_use]
    pub fn new(config: &AppConfig, domain: Option<DnsBinding>) -> Self {
        Self {
            name: config.app_stack_name(),
            export_prefix: config.stack_prefix.clone(),
            retain_buckets: config.retain_buckets,
            function: config.function.clone(),
            domain,
        }
    }

    /// Stack name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stacks whose exports this stack imports
    #[must_use]
    pub fn dependencies(&self) -> Vec<String> {
        self.domain
            .iter()
            .map(|binding| binding.stack_name.clone())
            .collect()
    }

    /// Renders the stack's template
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the template cannot be assembled
    pub fn synthesize(&self) -> Result<Template, TemplateError> {
        let mut template = Template::new("Photo gallery: photo storage, listing API and website");

        self.add_buckets(&mut template)?;
        self.add_function(&mut template)?;
        Self::add_http_api(&mut template)?;
        self.add_distribution(&mut template)?;
        self.add_outputs(&mut template)?;

        Ok(template)
    }

    fn bucket(&self, properties: Value) -> Resource {
        let policy = if self.retain_buckets {
            DeletionPolicy::Retain
        } else {
            DeletionPolicy::Delete
        };
        Resource::new("AWS::S3::Bucket", properties).removal_policy(policy)
    }

    fn add_buckets(&self, template: &mut Template) -> Result<(), TemplateError> {
        template.add_resource(
            ids::PHOTO_BUCKET,
            self.bucket(json!({
                "BucketEncryption": {
                    "ServerSideEncryptionConfiguration": [{
                        "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
                    }]
                }
            })),
        )?;

        template.add_resource(
            ids::WEBSITE_BUCKET,
            self.bucket(json!({
                "WebsiteConfiguration": { "IndexDocument": "index.html" },
                "PublicAccessBlockConfiguration": {
                    "BlockPublicAcls": false,
                    "BlockPublicPolicy": false,
                    "IgnorePublicAcls": false,
                    "RestrictPublicBuckets": false
                }
            })),
        )?;

        let public_read = PolicyDocument::new(vec![PolicyStatement::allow()
            .actions(&["s3:GetObject"])
            .any_principal()
            .resource(join(
                "",
                vec![get_att(ids::WEBSITE_BUCKET, "Arn"), json!("/*")],
            ))]);

        template.add_resource(
            ids::WEBSITE_BUCKET_POLICY,
            Resource::new(
                "AWS::S3::BucketPolicy",
                json!({
                    "Bucket": reference(ids::WEBSITE_BUCKET),
                    "PolicyDocument": public_read.to_value(),
                }),
            ),
        )
    }

    fn add_function(&self, template: &mut Template) -> Result<(), TemplateError> {
        let assume_role = PolicyDocument::new(vec![PolicyStatement::allow()
            .actions(&["sts:AssumeRole"])
            .service_principal("lambda.amazonaws.com")]);

        template.add_resource(
            ids::FUNCTION_ROLE,
            Resource::new(
                "AWS::IAM::Role",
                json!({
                    "AssumeRolePolicyDocument": assume_role.to_value(),
                    "ManagedPolicyArns": [sub(
                        "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"
                    )],
                }),
            ),
        )?;

        let bucket_access =
            PolicyDocument::new(photo_bucket_statements(&get_att(ids::PHOTO_BUCKET, "Arn")));

        template.add_resource(
            ids::FUNCTION_ROLE_POLICY,
            Resource::new(
                "AWS::IAM::Policy",
                json!({
                    "PolicyName": ids::FUNCTION_ROLE_POLICY,
                    "PolicyDocument": bucket_access.to_value(),
                    "Roles": [reference(ids::FUNCTION_ROLE)],
                }),
            ),
        )?;

        let code = match (&self.function.code_bucket, &self.function.code_key) {
            (Some(bucket), Some(key)) => json!({ "S3Bucket": bucket, "S3Key": key }),
            _ => {
                template.add_parameter(
                    ids::CODE_BUCKET_PARAMETER,
                    Parameter::string("Bucket holding the get-photos deployment package"),
                )?;
                template.add_parameter(
                    ids::CODE_KEY_PARAMETER,
                    Parameter::string("Key of the get-photos deployment package zip"),
                )?;
                json!({
                    "S3Bucket": reference(ids::CODE_BUCKET_PARAMETER),
                    "S3Key": reference(ids::CODE_KEY_PARAMETER),
                })
            }
        };

        template.add_resource(
            ids::FUNCTION,
            Resource::new(
                "AWS::Lambda::Function",
                json!({
                    "Runtime": "provided.al2023",
                    "Handler": "bootstrap",
                    "Architectures": [self.function.architecture.as_str()],
                    "MemorySize": self.function.memory_size,
                    "Timeout": self.function.timeout_secs,
                    "Code": code,
                    "Role": get_att(ids::FUNCTION_ROLE, "Arn"),
                    "Environment": {
                        "Variables": {
                            "APP_ENV": "production",
                            "PHOTO_BUCKET_NAME": reference(ids::PHOTO_BUCKET),
                        }
                    },
                }),
            )
            .depends_on(ids::FUNCTION_ROLE)
            .depends_on(ids::FUNCTION_ROLE_POLICY),
        )
    }

    fn add_http_api(template: &mut Template) -> Result<(), TemplateError> {
        template.add_resource(
            ids::HTTP_API,
            Resource::new(
                "AWS::ApiGatewayV2::Api",
                json!({
                    "Name": API_NAME,
                    "ProtocolType": "HTTP",
                    "CorsConfiguration": {
                        "AllowOrigins": ["*"],
                        "AllowMethods": ["GET"],
                    },
                }),
            ),
        )?;

        template.add_resource(
            ids::HTTP_API_STAGE,
            Resource::new(
                "AWS::ApiGatewayV2::Stage",
                json!({
                    "ApiId": reference(ids::HTTP_API),
                    "StageName": "$default",
                    "AutoDeploy": true,
                }),
            ),
        )?;

        template.add_resource(
            ids::INTEGRATION,
            Resource::new(
                "AWS::ApiGatewayV2::Integration",
                json!({
                    "ApiId": reference(ids::HTTP_API),
                    "IntegrationType": "AWS_PROXY",
                    "IntegrationUri": get_att(ids::FUNCTION, "Arn"),
                    "PayloadFormatVersion": "2.0",
                }),
            ),
        )?;

        template.add_resource(
            ids::ROUTE,
            Resource::new(
                "AWS::ApiGatewayV2::Route",
                json!({
                    "ApiId": reference(ids::HTTP_API),
                    "RouteKey": GET_PHOTOS_ROUTE_KEY,
                    "Target": join("/", vec![json!("integrations"), reference(ids::INTEGRATION)]),
                }),
            ),
        )?;

        template.add_resource(
            ids::INVOKE_PERMISSION,
            Resource::new(
                "AWS::Lambda::Permission",
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": get_att(ids::FUNCTION, "Arn"),
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": sub(&format!(
                        "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/*/*/getPhotos",
                        ids::HTTP_API
                    )),
                }),
            ),
        )
    }

    fn add_distribution(&self, template: &mut Template) -> Result<(), TemplateError> {
        // The website endpoint only speaks HTTP
        let website_domain = select(2, split("/", get_att(ids::WEBSITE_BUCKET, "WebsiteURL")));

        let mut config = json!({
            "Enabled": true,
            "HttpVersion": "http2",
            "Origins": [{
                "Id": "WebsiteOrigin",
                "DomainName": website_domain,
                "CustomOriginConfig": { "OriginProtocolPolicy": "http-only" },
            }],
            "DefaultCacheBehavior": {
                "TargetOriginId": "WebsiteOrigin",
                "ViewerProtocolPolicy": "allow-all",
                "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
                "Compress": true,
            },
        });

        if let Some(binding) = &self.domain {
            config["Aliases"] = json!([binding.domain_name]);
            config["ViewerCertificate"] = json!({
                "AcmCertificateArn": binding.certificate_arn,
                "SslSupportMethod": "sni-only",
                "MinimumProtocolVersion": "TLSv1.2_2021",
            });
        }

        template.add_resource(
            ids::DISTRIBUTION,
            Resource::new(
                "AWS::CloudFront::Distribution",
                json!({ "DistributionConfig": config }),
            ),
        )?;

        if let Some(binding) = &self.domain {
            template.add_resource(
                ids::ALIAS_RECORD,
                Resource::new(
                    "AWS::Route53::RecordSet",
                    json!({
                        "Name": format!("{}.", binding.domain_name),
                        "Type": "A",
                        "HostedZoneId": binding.hosted_zone_id,
                        "AliasTarget": {
                            "DNSName": get_att(ids::DISTRIBUTION, "DomainName"),
                            "HostedZoneId": CLOUDFRONT_HOSTED_ZONE_ID,
                        },
                    }),
                ),
            )?;
        }

        Ok(())
    }

    fn add_outputs(&self, template: &mut Template) -> Result<(), TemplateError> {
        let prefix = &self.export_prefix;

        template.add_output(
            "PhotoBucketName",
            Output::exported(
                reference(ids::PHOTO_BUCKET),
                "Bucket holding the photos",
                &format!("{prefix}PhotoBucket"),
            ),
        )?;

        template.add_output(
            "WebsiteBucketName",
            Output::exported(
                reference(ids::WEBSITE_BUCKET),
                "Bucket serving the frontend bundle",
                &format!("{prefix}WebsiteBucket"),
            ),
        )?;

        template.add_output(
            "WebsiteUrl",
            Output::exported(
                get_att(ids::DISTRIBUTION, "DomainName"),
                "Domain name of the distribution",
                &format!("{prefix}WebsiteUrl"),
            ),
        )?;

        template.add_output(
            "DistributionId",
            Output::exported(
                reference(ids::DISTRIBUTION),
                "Id of the distribution, for cache invalidation",
                &format!("{prefix}DistributionId"),
            ),
        )?;

        template.add_output(
            "ApiUrl",
            Output::exported(
                sub(&format!(
                    "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/",
                    ids::HTTP_API
                )),
                "Base URL of the photo API",
                &format!("{prefix}ApiUrl"),
            ),
        )
    }
}
