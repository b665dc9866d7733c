//! Request/response mapping onto the envelope.
//!
//! Request fields are written in the fixed order deployed brokers expect:
//! dbtype, dbtns, dbuser, hostname, hostip, hostapp, appcode, dbuserpwd,
//! remark.

use crate::error::ProtocolError;
use crate::model::{
    ConfigSource, CredentialRequest, CredentialResponse, DbKind, EncryptedCredential,
    ResponseOutcome, ResultCode,
};

use super::envelope::{decode_error, Envelope, REQUEST_ROOT, RESPONSE_ROOT};

pub const FIELD_DB_TYPE: &str = "dbtype";
pub const FIELD_TNS: &str = "dbtns";
pub const FIELD_USER: &str = "dbuser";
pub const FIELD_HOST_NAME: &str = "hostname";
pub const FIELD_HOST_IP: &str = "hostip";
pub const FIELD_APP_NAME: &str = "hostapp";
pub const FIELD_APP_CODE: &str = "appcode";
pub const FIELD_PASSWORD: &str = "dbuserpwd";
pub const FIELD_REMARK: &str = "remark";
pub const FIELD_RESULT_CODE: &str = "resultcode";
pub const FIELD_ERROR_MSG: &str = "errormsg";
pub const FIELD_NONCE: &str = "randomcode";

/// Request field order on the wire.
pub const REQUEST_FIELD_ORDER: &[&str] = &[
    FIELD_DB_TYPE,
    FIELD_TNS,
    FIELD_USER,
    FIELD_HOST_NAME,
    FIELD_HOST_IP,
    FIELD_APP_NAME,
    FIELD_APP_CODE,
    FIELD_PASSWORD,
    FIELD_REMARK,
];

pub fn encode_request(request: &CredentialRequest) -> Result<String, ProtocolError> {
    let mut envelope = Envelope::new(REQUEST_ROOT);
    envelope.push(FIELD_DB_TYPE, &request.db_kind.code().to_string());
    envelope.push(FIELD_TNS, &request.tns);
    envelope.push(FIELD_USER, &request.username);
    envelope.push(FIELD_HOST_NAME, &request.host_name);
    envelope.push(FIELD_HOST_IP, &request.host_ip);
    envelope.push(FIELD_APP_NAME, &request.app_name);
    envelope.push(FIELD_APP_CODE, &request.app_check_code);
    envelope.push(FIELD_PASSWORD, &request.fallback_password);
    envelope.push(FIELD_REMARK, request.config_source.as_str());
    envelope.to_xml()
}

/// Parse a request envelope, as a broker would.
///
/// The endpoint is not part of the envelope, so `broker_url` is empty.
pub fn decode_request(xml: &str) -> Result<CredentialRequest, ProtocolError> {
    let envelope = Envelope::parse(xml)?;

    let db_type = required(&envelope, xml, FIELD_DB_TYPE)?;
    let db_kind = db_type
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(DbKind::from_code)
        .ok_or_else(|| decode_error(xml, format!("invalid {} {:?}", FIELD_DB_TYPE, db_type)))?;

    let remark = required(&envelope, xml, FIELD_REMARK)?;
    let config_source = ConfigSource::from_wire(remark)
        .ok_or_else(|| decode_error(xml, format!("invalid {} {:?}", FIELD_REMARK, remark)))?;

    Ok(CredentialRequest {
        broker_url: String::new(),
        db_kind,
        tns: required(&envelope, xml, FIELD_TNS)?.to_string(),
        username: required(&envelope, xml, FIELD_USER)?.to_string(),
        fallback_password: required(&envelope, xml, FIELD_PASSWORD)?.to_string(),
        host_name: required(&envelope, xml, FIELD_HOST_NAME)?.to_string(),
        host_ip: required(&envelope, xml, FIELD_HOST_IP)?.to_string(),
        app_name: required(&envelope, xml, FIELD_APP_NAME)?.to_string(),
        app_check_code: required(&envelope, xml, FIELD_APP_CODE)?.to_string(),
        config_source,
    })
}

/// Serialize a response, as a broker would.
pub fn encode_response(response: &CredentialResponse) -> Result<String, ProtocolError> {
    let mut envelope = Envelope::new(RESPONSE_ROOT);
    envelope.push(FIELD_RESULT_CODE, &response.result_code.0.to_string());
    match &response.outcome {
        ResponseOutcome::Denied { error_message } => {
            envelope.push(FIELD_ERROR_MSG, error_message);
        }
        ResponseOutcome::Granted(credential) => {
            envelope.push(FIELD_TNS, &credential.tns);
            envelope.push(FIELD_USER, &credential.username);
            envelope.push(FIELD_PASSWORD, &credential.encrypted_password);
            envelope.push(FIELD_NONCE, &credential.nonce);
        }
    }
    envelope.to_xml()
}

pub fn decode_response(xml: &str) -> Result<CredentialResponse, ProtocolError> {
    let envelope = Envelope::parse(xml)?;

    let raw_code = required(&envelope, xml, FIELD_RESULT_CODE)?;
    let result_code = raw_code.trim().parse::<i32>().map(ResultCode).map_err(|_| {
        decode_error(xml, format!("invalid {} {:?}", FIELD_RESULT_CODE, raw_code))
    })?;

    let outcome = if result_code.is_denial() {
        ResponseOutcome::Denied {
            error_message: required(&envelope, xml, FIELD_ERROR_MSG)?.to_string(),
        }
    } else {
        ResponseOutcome::Granted(EncryptedCredential {
            tns: required(&envelope, xml, FIELD_TNS)?.to_string(),
            username: required(&envelope, xml, FIELD_USER)?.to_string(),
            encrypted_password: required(&envelope, xml, FIELD_PASSWORD)?.to_string(),
            nonce: required(&envelope, xml, FIELD_NONCE)?.to_string(),
        })
    };

    Ok(CredentialResponse {
        result_code,
        outcome,
    })
}

fn required<'a>(envelope: &'a Envelope, xml: &str, name: &str) -> Result<&'a str, ProtocolError> {
    envelope
        .get(name)
        .ok_or_else(|| decode_error(xml, format!("missing element {}", name)))
}
