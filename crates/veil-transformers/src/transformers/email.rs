use super::{template_parameter, Transformer};
use crate::{
    definition::TransformerDefinition,
    error::TransformerError,
    generators::{
        build_generator, build_u64_from_bytes, Engine, Generator, GeneratorSettings,
        MIN_GENERATOR_SIZE,
    },
    parameters::{
        column_definition, engine_definition, keep_null_definition, scan_raw,
        validate_definition, DynamicModeProperties, Parameter, ParameterDefinition, Parameters,
    },
    validation::{ValidationCollector, ValidationWarning},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::debug;
use veil_core::{ColumnRawValue, Recorder, TableDriver, Value};
use veil_template::{
    context::call_readable, RecordContextReadOnly, Scope, Template, TemplateError,
    TemplateRuntime,
};

pub const DEFAULT_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "zoho.com",
    "yandex.com",
    "protonmail.com",
    "gmx.com",
    "fastmail.com",
];

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9_.+-]+)@([a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+)$")
        .expect("invalid email regex")
});

const ORIGINAL_LOCAL_PART: &str = "original_local_part";
const ORIGINAL_DOMAIN: &str = "original_domain";
const RANDOM_STRING: &str = "random_string";

/// Splits an email into local part and domain.
pub fn parse_email(data: &[u8]) -> Result<(String, String), TransformerError> {
    let text = std::str::from_utf8(data).map_err(|_| TransformerError::InvalidEmail)?;
    let captures = EMAIL_REGEX
        .captures(text)
        .ok_or(TransformerError::InvalidEmail)?;
    Ok((captures[1].to_string(), captures[2].to_string()))
}

pub fn compose_email(local_part: &str, domain: &str) -> String {
    format!("{}@{}", local_part, domain)
}

pub fn definition() -> TransformerDefinition {
    TransformerDefinition::new(
        "RandomEmail",
        "Generate email addresses, randomly or derived from the original value",
        new_random_email_transformer,
    )
    .add_parameter(column_definition(
        "column name",
        &["text", "varchar", "char", "bpchar", "citext"],
    ))
    .add_parameter(
        ParameterDefinition::new("keep_original_domain", "keep the domain of the original email")
            .set_default_value("false")
            .set_dynamic_mode(DynamicModeProperties::new().set_column_types(&["bool"])),
    )
    .add_parameter(ParameterDefinition::new(
        "local_part_template",
        "template for the local part; sees .original_local_part, .original_domain and .random_string",
    ))
    .add_parameter(ParameterDefinition::new(
        "domain_part_template",
        "template for the domain; sees the same fields as local_part_template",
    ))
    .add_parameter(ParameterDefinition::new(
        "domains",
        "JSON list of domains to pick from instead of the built-in providers",
    ))
    .add_parameter(validate_definition("check that the generated email is well formed"))
    .add_parameter(
        ParameterDefinition::new(
            "max_random_length",
            "number of random bytes in the local part, hex encoded",
        )
        .set_default_value("32")
        .set_raw_value_validator(validate_max_random_length),
    )
    .add_parameter(keep_null_definition(true))
    .add_parameter(engine_definition())
}

fn validate_max_random_length(raw: &str, collector: &mut ValidationCollector) {
    match scan_raw::<i64>(raw) {
        Err(err) => collector.add(
            ValidationWarning::error("error parsing max_random_length")
                .add_meta("ParameterValue", raw)
                .set_error(err),
        ),
        Ok(length) if length <= 0 => collector.add(
            ValidationWarning::error("max_random_length must be greater than 0")
                .add_meta("ParameterValue", raw),
        ),
        Ok(_) => {}
    }
}

fn new_random_email_transformer(
    _driver: Arc<dyn TableDriver>,
    parameters: &Parameters,
    settings: &GeneratorSettings,
    collector: &mut ValidationCollector,
) -> Result<Box<dyn Transformer>, TransformerError> {
    let (column_name, column) = parameters.get_column_parameter_value("column", collector)?;
    // Only keep_original_domain can be dynamic.
    let dynamic_parameters = parameters
        .iter()
        .any(Parameter::is_dynamic)
        .then(|| parameters.clone());
    let keep_original_domain: bool = match dynamic_parameters {
        Some(_) => false,
        None => parameters.get_parameter_value("keep_original_domain", collector)?,
    };
    let local_part_template = template_parameter(parameters, "local_part_template", collector)?;
    let domain_part_template = template_parameter(parameters, "domain_part_template", collector)?;
    let domains: Vec<String> =
        parameters.get_parameter_value_with_default("domains", Vec::new(), collector)?;
    let validate: bool = parameters.get_parameter_value("validate", collector)?;
    let max_random_length: usize = parameters.get_parameter_value("max_random_length", collector)?;
    let keep_null: bool = parameters.get_parameter_value("keep_null", collector)?;
    let engine: String = parameters.get_parameter_value("engine", collector)?;
    let engine = engine.parse::<Engine>()?;

    let generator = build_generator(
        engine,
        max_random_length.max(MIN_GENERATOR_SIZE),
        settings,
    )?;

    debug!(
        column = %column_name,
        %engine,
        domains = domains.len(),
        dynamic = dynamic_parameters.is_some(),
        "random email transformer configured"
    );

    Ok(Box::new(RandomEmailTransformer {
        affected_columns: BTreeMap::from([(column.idx, column_name.clone())]),
        column_name,
        column_idx: column.idx,
        keep_original_domain,
        dynamic_parameters,
        keep_null,
        validate,
        max_random_length,
        domains,
        local_part_template,
        domain_part_template,
        generator,
        runtime: TemplateRuntime::new(),
        template_vars: HashMap::new(),
        buf: Vec::new(),
    }))
}

pub struct RandomEmailTransformer {
    column_name: String,
    column_idx: usize,
    affected_columns: BTreeMap<usize, String>,
    keep_original_domain: bool,
    dynamic_parameters: Option<Parameters>,
    keep_null: bool,
    validate: bool,
    max_random_length: usize,
    domains: Vec<String>,
    local_part_template: Option<Template>,
    domain_part_template: Option<Template>,
    generator: Box<dyn Generator>,
    runtime: TemplateRuntime,
    // Cleared after every row.
    template_vars: HashMap<&'static str, Value>,
    buf: Vec<u8>,
}

impl RandomEmailTransformer {
    fn needs_original(&self) -> bool {
        self.keep_original_domain
            || self.local_part_template.is_some()
            || self.domain_part_template.is_some()
    }

    fn build_email(
        &mut self,
        record: &dyn Recorder,
        original: &[u8],
    ) -> Result<String, TransformerError> {
        let random = self.generator.generate(original)?;
        let random_string = hex::encode(&random[..self.max_random_length.min(random.len())]);

        let mut original_domain = String::new();
        if self.needs_original() {
            let (local_part, domain) = parse_email(original)?;
            self.template_vars
                .insert(ORIGINAL_LOCAL_PART, Value::Text(local_part));
            self.template_vars
                .insert(ORIGINAL_DOMAIN, Value::Text(domain.clone()));
            original_domain = domain;
        }
        self.template_vars
            .insert(RANDOM_STRING, Value::Text(random_string.clone()));

        let local_part = match &self.local_part_template {
            Some(template) => render(
                template,
                record,
                &self.template_vars,
                &mut self.runtime,
                &mut self.buf,
            )?,
            None => random_string,
        };

        let domain = match &self.domain_part_template {
            Some(template) => render(
                template,
                record,
                &self.template_vars,
                &mut self.runtime,
                &mut self.buf,
            )?,
            None if self.keep_original_domain => original_domain,
            None => {
                let idx = build_u64_from_bytes(&random)?;
                if self.domains.is_empty() {
                    DEFAULT_EMAIL_DOMAINS[(idx % DEFAULT_EMAIL_DOMAINS.len() as u64) as usize]
                        .to_string()
                } else {
                    self.domains[(idx % self.domains.len() as u64) as usize].clone()
                }
            }
        };

        Ok(compose_email(&local_part, &domain))
    }
}

fn render(
    template: &Template,
    record: &dyn Recorder,
    vars: &HashMap<&'static str, Value>,
    runtime: &mut TemplateRuntime,
    buf: &mut Vec<u8>,
) -> Result<String, TransformerError> {
    buf.clear();
    let mut scope = EmailScope {
        record: RecordContextReadOnly::new(record),
        vars,
    };
    template
        .execute(&mut scope, runtime, buf)
        .map_err(TransformerError::TemplateExecution)?;
    Ok(String::from_utf8_lossy(buf).into_owned())
}

impl Transformer for RandomEmailTransformer {
    fn affected_columns(&self) -> &BTreeMap<usize, String> {
        &self.affected_columns
    }

    fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError> {
        let raw = record.get_raw_column_value_by_idx(self.column_idx)?;
        if raw.is_null && self.keep_null {
            return Ok(());
        }
        let original = raw.data.clone();

        if let Some(parameters) = &self.dynamic_parameters {
            self.keep_original_domain =
                parameters.get_dynamic_parameter_value("keep_original_domain", &*record)?;
        }

        let result = self.build_email(&*record, &original);
        self.template_vars.clear();
        let email = result?;

        if self.validate && !EMAIL_REGEX.is_match(&email) {
            debug!(column = %self.column_name, email = %email, "generated email is invalid");
            return Err(TransformerError::GeneratedEmailInvalid);
        }

        record.set_raw_column_value_by_idx(self.column_idx, ColumnRawValue::new(email))?;
        Ok(())
    }
}

/// Template scope of the email templates: the email fields plus the read-only
/// record methods.
struct EmailScope<'a> {
    record: RecordContextReadOnly<'a>,
    vars: &'a HashMap<&'static str, Value>,
}

impl Scope for EmailScope<'_> {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        if args.is_empty() {
            if let Some(value) = self.vars.get(name) {
                return Ok(value.clone());
            }
        }
        call_readable(&self.record, name, &args)
            .unwrap_or_else(|| Err(TemplateError::UnknownMember(name.to_string())))
    }
}
