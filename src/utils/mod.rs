mod jwt;
mod logging;

pub(crate) use jwt::decode_jwt_claims;
pub(crate) use logging::with_pretty_json_debug;
