use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use doclib::Credential;

/// Errors building or reading NTLM handshake messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NtlmError {
    #[error("failed to encode NTLM message: {0}")]
    Encode(String),

    #[error("invalid NTLM challenge: {0}")]
    Challenge(String),
}

/// `Authorization` value for the first (negotiate) leg.
pub fn negotiate_header(workstation: &str) -> Result<String, NtlmError> {
    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE
        | ntlmclient::Flags::REQUEST_TARGET
        | ntlmclient::Flags::NEGOTIATE_NTLM
        | ntlmclient::Flags::NEGOTIATE_WORKSTATION_SUPPLIED;

    let message = ntlmclient::Message::Negotiate(ntlmclient::NegotiateMessage {
        flags,
        supplied_domain: String::new(),
        supplied_workstation: workstation.to_owned(),
        os_version: Default::default(),
    });

    let bytes = message
        .to_bytes()
        .map_err(|e| NtlmError::Encode(format!("{e:?}")))?;

    Ok(format!("NTLM {}", STANDARD.encode(bytes)))
}

/// Pull the base64 NTLM token out of a `WWW-Authenticate` header value.
///
/// Servers may list several schemes in one header (`Negotiate, NTLM abc=`);
/// a bare `NTLM` with no token is not a challenge.
pub fn challenge_token(header: &str) -> Option<&str> {
    header
        .split(',')
        .map(str::trim)
        .filter_map(|scheme| scheme.strip_prefix("NTLM "))
        .map(str::trim)
        .find(|token| !token.is_empty())
}

/// `Authorization` value answering the server's challenge with `credential`.
pub fn authenticate_header(
    challenge_b64: &str,
    credential: &Credential,
    workstation: &str,
) -> Result<String, NtlmError> {
    let challenge_bytes = STANDARD
        .decode(challenge_b64)
        .map_err(|e| NtlmError::Challenge(format!("base64 decode failed: {e}")))?;

    let challenge = match ntlmclient::Message::try_from(challenge_bytes.as_slice()) {
        Ok(ntlmclient::Message::Challenge(c)) => c,
        Ok(_) => return Err(NtlmError::Challenge("not a challenge message".into())),
        Err(e) => return Err(NtlmError::Challenge(format!("{e:?}"))),
    };

    let target_info: Vec<u8> = challenge
        .target_information
        .iter()
        .flat_map(|entry| entry.to_bytes())
        .collect();

    let creds = ntlmclient::Credentials {
        username: credential.username.clone(),
        password: credential.secret.expose().to_owned(),
        domain: credential.domain.clone(),
    };

    let response = ntlmclient::respond_challenge_ntlm_v2(
        challenge.challenge,
        &target_info,
        ntlmclient::get_ntlm_time(),
        &creds,
    );

    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM;
    let message = response.to_message(&creds, workstation, flags);
    let bytes = message
        .to_bytes()
        .map_err(|e| NtlmError::Encode(format!("{e:?}")))?;

    Ok(format!("NTLM {}", STANDARD.encode(bytes)))
}
