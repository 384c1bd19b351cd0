//! Producer/consumer contract checking between specifications.
//!
//! Checks bidirectional compatibility: every consumer input must be backed
//! by a producer output, and every producer output must be accepted by a
//! consumer input. Matching is by port name only; the `TypeMismatch` kind
//! exists in the taxonomy but is not emitted yet.

use crate::specs::Specification;

/// Kind of contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Consumer requires an input the producer does not provide.
    MissingOutput,
    /// Producer provides an output the consumer does not accept.
    MissingInput,
    /// Reserved: name matches but shapes disagree.
    TypeMismatch,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::MissingOutput => write!(f, "missing-output"),
            ViolationKind::MissingInput => write!(f, "missing-input"),
            ViolationKind::TypeMismatch => write!(f, "type-mismatch"),
        }
    }
}

/// One incompatibility between a producer and a consumer specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub kind: ViolationKind,
    pub message: String,
    pub producer: String,
    pub consumer: String,
    pub detail: Option<String>,
}

/// A named producer/consumer pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub producer_name: String,
    pub consumer_name: String,
    pub producer_spec: Specification,
    pub consumer_spec: Specification,
}

/// Validate a producer specification against a consumer specification.
///
/// Violations are ordered: all `missing-output` findings in consumer-input
/// order, then all `missing-input` findings in producer-output order. Two
/// specs with no ports on either side produce zero violations.
pub fn validate_contract(
    producer: &Specification,
    consumer: &Specification,
) -> Vec<ContractViolation> {
    let mut violations = Vec::new();

    let producer_outputs = producer.outputs.as_deref().unwrap_or_default();
    let consumer_inputs = consumer.inputs.as_deref().unwrap_or_default();

    for input in consumer_inputs {
        if !producer_outputs.iter().any(|o| o.name == input.name) {
            violations.push(ContractViolation {
                kind: ViolationKind::MissingOutput,
                message: format!("Producer does not provide required output: {}", input.name),
                producer: producer.name.clone(),
                consumer: consumer.name.clone(),
                detail: Some(format!(
                    "Consumer requires input \"{}\" but producer does not provide it",
                    input.name
                )),
            });
        }
    }

    for output in producer_outputs {
        if !consumer_inputs.iter().any(|i| i.name == output.name) {
            violations.push(ContractViolation {
                kind: ViolationKind::MissingInput,
                message: format!("Consumer does not accept producer output: {}", output.name),
                producer: producer.name.clone(),
                consumer: consumer.name.clone(),
                detail: Some(format!(
                    "Producer provides output \"{}\" but consumer does not accept it",
                    output.name
                )),
            });
        }
    }

    violations
}

/// Validate a bundled [`Contract`].
pub fn check_contract(contract: &Contract) -> Vec<ContractViolation> {
    validate_contract(&contract.producer_spec, &contract.consumer_spec)
}
