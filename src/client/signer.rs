use crate::client::headers;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha1::Sha1;

pub(super) struct Signer {
    pub(super) hmac: Hmac<Sha1>,
    pub(super) access_key_id: String,
}

pub(super) struct WriteSignature {
    pub(super) date: String,
    pub(super) raw_length: String,
    pub(super) content_md5: String,
    pub(super) authorization: String,
}

pub(super) struct ReadSignature {
    pub(super) date: String,
    pub(super) authorization: String,
}

impl Signer {
    // SignString = VERB + "\n"
    //     + CONTENT-MD5 + "\n"
    //     + CONTENT-TYPE + "\n"
    //     + DATE + "\n"
    //     + CanonicalizedLOGHeaders + "\n"
    //     + CanonicalizedResource
    //
    // CanonicalizedLOGHeaders: the x-log-* request headers, lowercased and
    // sorted, joined as `name:value` lines.
    // CanonicalizedResource: the resource path, plus `?` and the sorted query
    // string when present.
    pub fn sign_write(&self, resource: &str, raw_length: usize, body: &[u8]) -> WriteSignature {
        let mut mac = self.hmac.clone();

        let date = http_date();
        let raw_length = raw_length.to_string();
        let content_md5 = hex::encode_upper(md5::compute(body).as_ref());

        mac.update(b"POST\n");
        mac.update(content_md5.as_bytes());
        mac.update(b"\n");

        mac.update(headers::DEFAULT_CONTENT_TYPE.as_bytes());
        mac.update(b"\n");

        mac.update(date.as_bytes());
        mac.update(b"\n");

        mac.update(headers::LOG_API_VERSION.as_bytes());
        mac.update(b":");
        mac.update(headers::API_VERSION.as_bytes());
        mac.update(b"\n");
        mac.update(headers::LOG_BODY_RAW_SIZE.as_bytes());
        mac.update(b":");
        mac.update(raw_length.as_bytes());
        mac.update(b"\n");
        mac.update(headers::LOG_SIGNATURE_METHOD.as_bytes());
        mac.update(b":");
        mac.update(headers::SIGNATURE_METHOD.as_bytes());
        mac.update(b"\n");

        mac.update(resource.as_bytes());

        WriteSignature {
            authorization: self.finish(mac),
            date,
            raw_length,
            content_md5,
        }
    }

    // GET requests carry no body: the Content-MD5 and Content-Type lines are
    // empty, and x-log-bodyrawsize is not sent.
    pub fn sign_read(&self, resource: &str) -> ReadSignature {
        let mut mac = self.hmac.clone();

        let date = http_date();

        mac.update(b"GET\n");
        mac.update(b"\n");
        mac.update(b"\n");

        mac.update(date.as_bytes());
        mac.update(b"\n");

        mac.update(headers::LOG_API_VERSION.as_bytes());
        mac.update(b":");
        mac.update(headers::API_VERSION.as_bytes());
        mac.update(b"\n");
        mac.update(headers::LOG_SIGNATURE_METHOD.as_bytes());
        mac.update(b":");
        mac.update(headers::SIGNATURE_METHOD.as_bytes());
        mac.update(b"\n");

        mac.update(resource.as_bytes());

        ReadSignature {
            authorization: self.finish(mac),
            date,
        }
    }

    fn finish(&self, mac: Hmac<Sha1>) -> String {
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());
        format!("LOG {}:{}", self.access_key_id, signature)
    }
}

fn http_date() -> String {
    Timestamp::now()
        .strftime("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
