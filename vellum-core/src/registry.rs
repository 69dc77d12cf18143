//! Resource-type registry: a compile-time database of CloudFormation
//! resource-type shapes the generator consults to decide between a typed
//! property struct and an open JSON map.
//!
//! Every table here is `&'static`, in the style of
//! `carina-provider-awscc::resources::ResourceConfig` — no runtime schema
//! parsing, matching the "Static registries" design note: this data would,
//! in a production build, be code-generated from the CloudFormation resource
//! provider schemas, not hand-maintained, but the shape of the lookup is the
//! same either way.

/// `service.Type` pairs known to exist. Resources outside this set still
/// generate (as an untyped placeholder); this only gates typed-struct
/// resolution and category lookup confidence.
const KNOWN_TYPES: &[&str] = &[
    "s3.Bucket",
    "s3.BucketPolicy",
    "ec2.VPC",
    "ec2.Subnet",
    "ec2.SecurityGroup",
    "ec2.SecurityGroupIngress",
    "ec2.SecurityGroupEgress",
    "ec2.Instance",
    "ec2.InternetGateway",
    "ec2.VPCGatewayAttachment",
    "ec2.RouteTable",
    "ec2.Route",
    "ec2.SubnetRouteTableAssociation",
    "ec2.NatGateway",
    "ec2.EIP",
    "ec2.VPCEndpoint",
    "iam.Role",
    "iam.Policy",
    "iam.User",
    "iam.Group",
    "iam.InstanceProfile",
    "lambda.Function",
    "lambda.Permission",
    "lambda.EventSourceMapping",
    "dynamodb.Table",
    "rds.DBInstance",
    "rds.DBSubnetGroup",
    "sns.Topic",
    "sns.Subscription",
    "sqs.Queue",
    "sqs.QueuePolicy",
    "cloudfront.Distribution",
    "apigateway.RestApi",
    "apigateway.Deployment",
    "apigateway.Stage",
    "elasticloadbalancingv2.LoadBalancer",
    "elasticloadbalancingv2.TargetGroup",
    "elasticloadbalancingv2.Listener",
    "autoscaling.AutoScalingGroup",
    "autoscaling.LaunchConfiguration",
    "ecs.Cluster",
    "ecs.Service",
    "ecs.TaskDefinition",
    "eks.Cluster",
    "kms.Key",
    "logs.LogGroup",
    "events.Rule",
    "codebuild.Project",
    "codepipeline.Pipeline",
    "cognito.UserPool",
    "cognito.UserPoolClient",
    "ssm.Parameter",
    "serverless.Function",
    "serverless.Api",
    "serverless.HttpApi",
    "serverless.SimpleTable",
];

pub fn type_exists(service: &str, ty: &str) -> bool {
    let key = format!("{service}.{ty}");
    KNOWN_TYPES.contains(&key.as_str())
}

/// Explicit overrides keyed `service.T.P` -> nested typed struct name.
/// Consulted first, for the handful of properties whose typed-struct name
/// does not follow the flat (`Base_P`) or nested (`T_P`) convention.
const PROPERTY_TYPE_OVERRIDES: &[(&str, &str)] = &[
    ("s3.Bucket.CorsConfiguration", "CorsConfiguration"),
    ("s3.Bucket.LifecycleConfiguration", "LifecycleConfiguration"),
    ("s3.Bucket.NotificationConfiguration", "NotificationConfiguration"),
    ("s3.Bucket.WebsiteConfiguration", "WebsiteConfiguration"),
    ("s3.Bucket.VersioningConfiguration", "VersioningConfiguration"),
    ("ec2.SecurityGroup.SecurityGroupIngress", "Ingress"),
    ("ec2.SecurityGroup.SecurityGroupEgress", "Egress"),
    ("iam.Role.AssumeRolePolicyDocument", "PolicyDocument"),
    ("iam.Role.Policies", "Policy"),
    ("iam.Policy.PolicyDocument", "PolicyDocument"),
    ("lambda.Function.Environment", "Environment"),
    ("lambda.Function.VpcConfig", "VpcConfig"),
    ("lambda.Function.DeadLetterConfig", "DeadLetterConfig"),
    ("dynamodb.Table.AttributeDefinitions", "AttributeDefinition"),
    ("dynamodb.Table.KeySchema", "KeySchema"),
    ("dynamodb.Table.GlobalSecondaryIndexes", "GlobalSecondaryIndex"),
    ("dynamodb.Table.ProvisionedThroughput", "ProvisionedThroughput"),
    ("cloudfront.Distribution.DistributionConfig", "DistributionConfig"),
    (
        "elasticloadbalancingv2.Listener.DefaultActions",
        "Action",
    ),
];

/// Resolve the nested typed struct name for property `property_name` on
/// enclosing type `enclosing_type` (a `service.Type` pair for a top-level
/// resource, or a bare already-resolved nested type name such as
/// `DistributionConfig` for a property nested inside another property).
///
/// Resolution order: (1) the override map keyed `service.T.P`; (2) the flat
/// pattern `Base_P`, where `Base` is `T` up to its first underscore --
/// property types are named after the base resource, not the immediately
/// enclosing property; (3) the nested pattern `T_P`; (4) none.
pub fn resolve_property_type(enclosing_type: &str, property_name: &str) -> Option<String> {
    if enclosing_type.contains('.') {
        let key = format!("{enclosing_type}.{property_name}");
        if let Some((_, name)) = PROPERTY_TYPE_OVERRIDES.iter().find(|(k, _)| *k == key) {
            return Some((*name).to_string());
        }
    }

    let bare_type = enclosing_type.rsplit('.').next().unwrap_or(enclosing_type);
    let base = bare_type.split('_').next().unwrap_or(bare_type);

    let flat = format!("{base}_{property_name}");
    if KNOWN_NESTED_TYPES.contains(&flat.as_str()) {
        return Some(flat);
    }

    let nested = format!("{bare_type}_{property_name}");
    if nested != flat && KNOWN_NESTED_TYPES.contains(&nested.as_str()) {
        return Some(nested);
    }

    None
}

/// Nested property-type names the registry actually knows how to resolve to
/// (gates the flat/nested fallback patterns in [`resolve_property_type`]).
const KNOWN_NESTED_TYPES: &[&str] = &[
    "Bucket_Tags",
    "Bucket_CorsConfiguration",
    "SecurityGroup_Tags",
    "Role_Tags",
    "Function_Tags",
    "Function_Environment",
    "Table_Tags",
    "DistributionConfig_Origins",
    "DistributionConfig_DefaultCacheBehavior",
    "LoadBalancer_Tags",
];

/// Element type for an array-valued property, after singularizing the
/// property name, using the same resolution order as
/// [`resolve_property_type`].
pub fn resolve_element_type(enclosing_type: &str, property_name: &str) -> Option<String> {
    let singular = singularize(property_name);
    resolve_property_type(enclosing_type, &singular)
}

/// Singularize a property name for array-element type lookup:
/// `-ies -> -y`, `-sses -> drop one s`, trailing `-s` (not `-ss`) -> drop `s`.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// `service.T.P` keys whose target-DSL field is pointer-typed.
const POINTER_FIELDS: &[&str] = &[
    "ec2.SecurityGroup.VpcId",
    "ec2.Subnet.VpcId",
    "rds.DBInstance.DBSubnetGroupName",
    "lambda.Function.ReservedConcurrentExecutions",
];

pub fn is_pointer_field(service: &str, ty: &str, property: &str) -> bool {
    let key = format!("{service}.{ty}.{property}");
    POINTER_FIELDS.contains(&key.as_str())
}

/// `service.P` -> (enum name, allowed values).
const ENUM_TABLE: &[(&str, &str, &[&str])] = &[
    ("s3", "AccessControl", &["Private", "PublicRead", "PublicReadWrite", "AuthenticatedRead"]),
    ("ec2", "InstanceTenancy", &["default", "dedicated", "host"]),
    ("ec2", "VolumeType", &["standard", "io1", "io2", "gp2", "gp3", "sc1", "st1"]),
    ("dynamodb", "BillingMode", &["PROVISIONED", "PAY_PER_REQUEST"]),
    ("dynamodb", "AttributeType", &["S", "N", "B"]),
    ("dynamodb", "KeyType", &["HASH", "RANGE"]),
    ("lambda", "Runtime", &["python3.12", "python3.11", "nodejs20.x", "nodejs18.x", "go1.x", "java21"]),
    ("rds", "Engine", &["mysql", "postgres", "mariadb", "aurora-mysql", "aurora-postgresql"]),
    ("elasticloadbalancingv2", "Scheme", &["internet-facing", "internal"]),
    ("iam", "Effect", &["Allow", "Deny"]),
];

pub fn enum_for_property(service: &str, property: &str) -> Option<(&'static str, &'static [&'static str])> {
    ENUM_TABLE
        .iter()
        .find(|(s, p, _)| *s == service && *p == property)
        .map(|(_, name, values)| (*name, *values))
}

/// Enum constant naming: `{Service}{EnumName}{Value}`, camel-cased by
/// splitting on non-alphanumerics, capitalizing each word, lower-casing the
/// tail of each word.
pub fn enum_constant_name(service: &str, enum_name: &str, value: &str) -> String {
    let service_cap = capitalize(service);
    let value_cap = camel_words(value);
    format!("{service_cap}{enum_name}{value_cap}")
}

fn camel_words(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let rest: String = chars.collect::<String>().to_lowercase();
            format!("{}{}", first.to_uppercase(), rest)
        }
    }
}

/// File-placement category for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Compute,
    Storage,
    Database,
    Network,
    Security,
    Messaging,
    Monitoring,
    Cicd,
    Infra,
    Main,
}

impl Category {
    pub fn file_stem(self) -> &'static str {
        match self {
            Category::Compute => "compute",
            Category::Storage => "storage",
            Category::Database => "database",
            Category::Network => "network",
            Category::Security => "security",
            Category::Messaging => "messaging",
            Category::Monitoring => "monitoring",
            Category::Cicd => "cicd",
            Category::Infra => "infra",
            Category::Main => "main",
        }
    }
}

const EC2_COMPUTE_KEYWORDS: &[&str] = &["Instance", "LaunchTemplate", "LaunchConfiguration", "SpotFleet", "Host"];
const EC2_NETWORK_KEYWORDS: &[&str] = &[
    "VPC", "Subnet", "RouteTable", "Route", "InternetGateway", "NatGateway", "EIP",
    "NetworkAcl", "SecurityGroup", "VPN", "TransitGateway", "Endpoint",
];

pub fn category_for_type(type_name: &str) -> Category {
    let service_and_ty = type_name.strip_prefix("AWS::");
    let Some(rest) = service_and_ty else {
        return Category::Main;
    };
    let mut parts = rest.splitn(2, "::");
    let service = parts.next().unwrap_or_default();
    let ty = parts.next().unwrap_or_default();

    if service == "EC2" {
        // Endpoint always forces network even though it also reads as compute-adjacent.
        if ty.contains("Endpoint") {
            return Category::Network;
        }
        if EC2_COMPUTE_KEYWORDS.iter().any(|k| ty.contains(k)) {
            return Category::Compute;
        }
        if EC2_NETWORK_KEYWORDS.iter().any(|k| ty.contains(k)) {
            return Category::Network;
        }
        return Category::Compute;
    }

    match service {
        "Lambda" | "ECS" | "EKS" | "AutoScaling" | "Batch" | "Serverless" => Category::Compute,
        "S3" | "EFS" | "FSx" => Category::Storage,
        "DynamoDB" | "RDS" | "ElastiCache" | "Redshift" | "DocDB" => Category::Database,
        "ElasticLoadBalancingV2" | "ElasticLoadBalancing" | "Route53" | "CloudFront"
        | "ApiGateway" | "ApiGatewayV2" | "DirectConnect" => Category::Network,
        "IAM" | "KMS" | "SecretsManager" | "Cognito" | "GuardDuty" | "WAF" | "WAFv2" => {
            Category::Security
        }
        "SNS" | "SQS" | "Events" | "EventBridge" | "MQ" | "Kinesis" => Category::Messaging,
        "CloudWatch" | "Logs" | "XRay" => Category::Monitoring,
        "CodeBuild" | "CodePipeline" | "CodeDeploy" | "CodeCommit" => Category::Cicd,
        "CloudFormation" | "SSM" | "Config" | "Backup" | "ResourceGroups" => Category::Infra,
        _ => Category::Main,
    }
}

/// Property names that always carry list values even when the
/// CloudFormation shape is ambiguous.
pub const LIST_PROPERTIES: &[&str] = &[
    "AvailabilityZones",
    "SubnetIds",
    "SecurityGroupIds",
    "TargetGroupArns",
    "NotificationArns",
    "CallbackURLs",
    "LogoutURLs",
    "Policies",
    "VpcSecurityGroupIds",
    "LoadBalancerNames",
    "Subnets",
    "RouteTableIds",
    "SecurityGroups",
    "ImageIds",
    "InstanceIds",
    "Statements",
];

pub fn is_list_property(name: &str) -> bool {
    LIST_PROPERTIES.contains(&name)
}

/// Reserved identifiers that collide with intrinsic type names; a resource
/// logical ID matching one of these gets a `Resource` suffix.
pub const RESERVED_NAMES: &[&str] = &[
    "Transform", "Ref", "GetAtt", "Sub", "If", "Join", "Select", "GetAZs",
    "Equals", "And", "Or", "Not", "Base64", "FindInMap", "Cidr",
    "ImportValue", "Split", "Condition", "Parameter", "Output", "Tag",
];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Base package names the generator's own categories claim, consulted by
/// package-name collision avoidance (`crate::codegen::naming::package_name`).
pub const RESOURCE_PACKAGE_NAMES: &[&str] = &[
    "s3", "ec2", "iam", "lambda", "dynamodb", "rds", "sns", "sqs",
    "cloudfront", "apigateway", "elasticloadbalancingv2", "autoscaling",
    "ecs", "eks", "kms", "logs", "events", "codebuild", "codepipeline",
    "cognito", "ssm",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularize_rules() {
        assert_eq!(singularize("Origins"), "Origin");
        assert_eq!(singularize("Policies"), "Policy");
        assert_eq!(singularize("Addresses"), "Address");
        assert_eq!(singularize("Statement"), "Statement");
    }

    #[test]
    fn ec2_endpoint_forces_network() {
        assert_eq!(
            category_for_type("AWS::EC2::VPCEndpoint"),
            Category::Network
        );
    }

    #[test]
    fn ec2_instance_is_compute() {
        assert_eq!(category_for_type("AWS::EC2::Instance"), Category::Compute);
    }

    #[test]
    fn ec2_subnet_is_network() {
        assert_eq!(category_for_type("AWS::EC2::Subnet"), Category::Network);
    }

    #[test]
    fn enum_constant_naming() {
        assert_eq!(
            enum_constant_name("iam", "Effect", "Allow"),
            "IamEffectAllow"
        );
        assert_eq!(
            enum_constant_name("ec2", "VolumeType", "gp3"),
            "Ec2VolumeTypeGp3"
        );
    }

    #[test]
    fn reserved_name_detection() {
        assert!(is_reserved_name("Transform"));
        assert!(!is_reserved_name("MyBucket"));
    }
}
