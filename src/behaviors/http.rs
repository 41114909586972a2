//! HTTP-flavored misbehaviors.
//!
//! These mimic an HTTP server by reading one line (the request) and sending
//! a synthetic response. They answer every request URL on the running port.
//! One parametrized behavior covers the whole family; the prebuilt instances
//! differ only in their [`HttpResponseSpec`].

use crate::behavior::{Behavior, Options};
use crate::response::NaiveHttpResponse;
use crate::stream::Connection;
use rand::Rng;

/// The bad status codes served by `HttpRandomBadResponses`.
pub const BAD_HTTP_CODES: [u16; 6] = [401, 403, 404, 500, 502, 503];

/// Declarative description of a synthetic HTTP response.
///
/// The status code is picked uniformly over `status_codes` per request, so
/// repeating a code in the list raises its effective weight.
#[derive(Debug, Clone)]
pub struct HttpResponseSpec {
    status_codes: Vec<u16>,
    success_body: Option<String>,
}

impl HttpResponseSpec {
    /// Always respond with `code`.
    pub fn fixed(code: u16) -> Self {
        Self::one_of(&[code])
    }

    /// Respond with a code picked uniformly from `codes` per request.
    pub fn one_of(codes: &[u16]) -> Self {
        assert!(!codes.is_empty(), "status code list must be non-empty");
        HttpResponseSpec {
            status_codes: codes.to_vec(),
            success_body: None,
        }
    }

    /// Body to use when the picked code is 200.
    pub fn with_success_body(mut self, body: &str) -> Self {
        self.success_body = Some(body.to_string());
        self
    }

    fn pick_code(&self) -> u16 {
        let index = rand::thread_rng().gen_range(0..self.status_codes.len());
        self.status_codes[index]
    }

    fn body_for(&self, code: u16) -> String {
        match (&self.success_body, code) {
            (Some(body), 200) => body.clone(),
            _ => code.to_string(),
        }
    }
}

/// A behavior that serves the response described by an [`HttpResponseSpec`].
pub struct HttpResponder {
    name: String,
    spec: HttpResponseSpec,
}

impl HttpResponder {
    pub fn new(name: &str, spec: HttpResponseSpec) -> Self {
        HttpResponder {
            name: name.to_string(),
            spec,
        }
    }
}

#[async_trait::async_trait]
impl Behavior for HttpResponder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, conn: &mut Connection, _options: &Options) -> std::io::Result<()> {
        // Read the request before responding; the response goes out even if
        // the peer sent nothing.
        let _ = conn.read_line().await?;

        let code = self.spec.pick_code();
        let body = self.spec.body_for(code);
        let response = NaiveHttpResponse::new(code, reason_phrase(code), "text/html", &body);
        conn.write_bytes(&response.to_bytes()).await
    }
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown Error",
    }
}

/// The fixed page served on 200 by the partially-failing responders.
pub fn successful_html() -> String {
    concat!(
        "<!DOCTYPE html>\n",
        "<html>\n",
        "  <head>\n",
        "    <title>break-a-client</title>\n",
        "  </head>\n",
        "  <body>\n",
        "    <h1>Success</h1>\n",
        "  </body>\n",
        "</html>\n",
    )
    .to_string()
}

/// The prebuilt HTTP responders, in catalogue order.
pub(crate) fn builtin_responders() -> Vec<HttpResponder> {
    vec![
        HttpResponder::new("HttpRefuseAllCredentials", HttpResponseSpec::fixed(401)),
        HttpResponder::new("Http403Forbidden", HttpResponseSpec::fixed(403)),
        HttpResponder::new(
            "HttpRandomBadResponses",
            HttpResponseSpec::one_of(&BAD_HTTP_CODES),
        ),
        // 80% of the calls return 500 Internal Server Error
        HttpResponder::new(
            "HttpMostlyBadResponses",
            HttpResponseSpec::one_of(&[200, 500, 500, 500, 500])
                .with_success_body(&successful_html()),
        ),
        // 20% of the calls return 500 Internal Server Error
        HttpResponder::new(
            "HttpIntermittentBadResponse",
            HttpResponseSpec::one_of(&[200, 200, 200, 200, 500])
                .with_success_body(&successful_html()),
        ),
    ]
}
