use crate::child_span_debug;
use crate::core::adapters::errors::AdapterError;
use crate::core::adapters::{Header, RequestData};
use crate::core::models::ext::{ExtImpBidder, ExtImpSonobi};
use crate::core::models::openrtb::{BidRequest, Imp};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, warn};

const CONTENT_TYPE: &str = "application/json;charset=utf-8";
const ACCEPT: &str = "application/json";

fn parse_tag_id(imp: &Imp) -> Result<String, AdapterError> {
    let envelope = ExtImpBidder::decode(imp.ext.as_ref())
        .map_err(|e| AdapterError::malformed_ext(&imp.id, e))?;

    let params =
        ExtImpSonobi::decode(&envelope).map_err(|e| AdapterError::malformed_ext(&imp.id, e))?;

    Ok(params.tag_id)
}

fn encode_request<T: Serialize + ?Sized>(
    uri: &str,
    body: &T,
    imp_id: &str,
) -> Result<RequestData, AdapterError> {
    let body = serde_json::to_vec(body).map_err(|source| AdapterError::Serialization {
        imp_id: imp_id.to_string(),
        source,
    })?;

    Ok(RequestData {
        imp_id: imp_id.to_string(),
        method: Method::POST,
        uri: uri.to_string(),
        headers: vec![
            Header::new("content-type", CONTENT_TYPE.to_string()),
            Header::new("accept", ACCEPT.to_string()),
        ],
        body,
    })
}

/// Breaks `req` out into one exchange request per impression, with the
/// impression tag id pulled from its bidder ext into `imp.tagid`.
/// Impressions whose ext cannot be decoded are skipped and reported
pub(super) fn build_requests(uri: &str, req: &BidRequest) -> (Vec<RequestData>, Vec<AdapterError>) {
    build_requests_with(uri, req, encode_request::<BidRequest>)
}

fn build_requests_with<E>(
    uri: &str,
    req: &BidRequest,
    encode: E,
) -> (Vec<RequestData>, Vec<AdapterError>)
where
    E: Fn(&str, &BidRequest, &str) -> Result<RequestData, AdapterError>,
{
    let _span = child_span_debug!(
        "sonobi_build_requests",
        req_id = %req.id,
        imp_count = req.imp.len()
    )
    .entered();

    let mut requests = Vec::with_capacity(req.imp.len());
    let mut errors = Vec::new();

    for imp in &req.imp {
        let tag_id = match parse_tag_id(imp) {
            Ok(tag_id) => tag_id,
            Err(e) => {
                warn!("Skipping imp: {}", e);
                errors.push(e);
                continue;
            }
        };

        let mut single_imp = imp.clone();
        single_imp.tagid = Some(tag_id);

        let single_req = req.clone_with_imp(single_imp);

        match encode(uri, &single_req, &imp.id) {
            Ok(request) => {
                debug!("Built sonobi request for imp {} ({} bytes)", imp.id, request.body.len());
                requests.push(request);
            }
            Err(e) => {
                warn!("Skipping imp: {}", e);
                errors.push(e);
            }
        }
    }

    (requests, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::errors::ErrorKind;
    use crate::core::models::openrtb::{BannerBuilder, BidRequestBuilder, ImpBuilder};
    use serde::Serializer;
    use serde::ser::Error as _;
    use serde_json::json;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    const URI: &str = "https://apex.go.sonobi.com/prebid?partnerid=71d9d3d8af";

    fn imp_with_ext(id: &str, ext: Option<serde_json::Value>) -> Imp {
        ImpBuilder::default()
            .id(id.to_string())
            .banner(Some(BannerBuilder::default().w(Some(300)).h(Some(250)).build().unwrap()))
            .ext(ext)
            .build()
            .unwrap()
    }

    fn imp_with_tag(id: &str, tag: &str) -> Imp {
        imp_with_ext(id, Some(json!({"bidder": {"TagID": tag}})))
    }

    fn request(imps: Vec<Imp>) -> BidRequest {
        BidRequestBuilder::default()
            .id("req-1".to_string())
            .imp(imps)
            .site(Some(json!({"page": "https://example.com"})))
            .device(Some(json!({"ua": "test-agent"})))
            .tmax(500)
            .build()
            .unwrap()
    }

    fn decode_body(request: &RequestData) -> BidRequest {
        serde_json::from_slice(&request.body).unwrap()
    }

    #[test]
    fn test_one_request_per_imp_in_order() {
        let req = request(vec![
            imp_with_tag("imp1", "tag1"),
            imp_with_tag("imp2", "tag2"),
            imp_with_tag("imp3", "tag3"),
        ]);

        let (requests, errors) = build_requests(URI, &req);

        assert!(errors.is_empty());
        assert_eq!(requests.len(), 3);

        let imp_ids: Vec<_> = requests.iter().map(|r| r.imp_id.as_str()).collect();
        assert_eq!(imp_ids, vec!["imp1", "imp2", "imp3"]);

        for (request, expected_tag) in requests.iter().zip(["tag1", "tag2", "tag3"]) {
            let body = decode_body(request);
            assert_eq!(body.imp.len(), 1, "Exchange accepts exactly one imp");
            assert_eq!(body.imp[0].id, request.imp_id);
            assert_eq!(body.imp[0].tagid.as_deref(), Some(expected_tag));
        }
    }

    #[test]
    fn test_request_shape() {
        let req = request(vec![imp_with_tag("imp1", "tag1")]);
        let (requests, _) = build_requests(URI, &req);
        let request = &requests[0];

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.uri, URI);
        assert_eq!(
            request.headers,
            vec![
                Header::new("content-type", "application/json;charset=utf-8".to_string()),
                Header::new("accept", "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_level_fields_carried_over() {
        let req = request(vec![imp_with_tag("imp1", "tag1")]);
        let (requests, _) = build_requests(URI, &req);
        let body = decode_body(&requests[0]);

        assert_eq!(body.id, "req-1");
        assert_eq!(body.site, req.site);
        assert_eq!(body.device, req.device);
        assert_eq!(body.tmax, 500);
        assert_eq!(body.imp[0].banner, req.imp[0].banner);
        assert_eq!(body.imp[0].ext, req.imp[0].ext, "Bidder ext passes through");
    }

    #[test]
    fn test_bad_ext_isolated_to_its_imp() {
        let req = request(vec![
            imp_with_tag("imp1", "tag1"),
            imp_with_ext("imp2", Some(json!({"bidder": {}}))),
            imp_with_tag("imp3", "tag3"),
            imp_with_ext("imp4", Some(json!({"bidder": {"placement": "x"}}))),
        ]);

        let (requests, errors) = build_requests(URI, &req);

        let imp_ids: Vec<_> = requests.iter().map(|r| r.imp_id.as_str()).collect();
        assert_eq!(imp_ids, vec!["imp1", "imp3"]);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::MalformedExtension));
        assert!(errors[0].to_string().contains("imp2"));
        assert!(errors[1].to_string().contains("imp4"));
    }

    #[test]
    fn test_every_ext_failure_reported() {
        let req = request(vec![
            imp_with_ext("missing", None),
            imp_with_ext("no_bidder", Some(json!({"foo": 1}))),
            imp_with_ext("not_object", Some(json!("tag1"))),
            imp_with_ext("bad_type", Some(json!({"bidder": {"TagID": 7}}))),
        ]);

        let (requests, errors) = build_requests(URI, &req);

        assert!(requests.is_empty());
        assert_eq!(errors.len(), 4);

        let stages: Vec<_> = errors
            .iter()
            .map(|e| match e {
                AdapterError::MalformedExtension { stage, .. } => stage.to_string(),
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(stages, vec!["missing", "envelope", "envelope", "params"]);
    }

    #[test]
    fn test_no_imps_no_requests_no_errors() {
        let req = request(vec![]);
        let (requests, errors) = build_requests(URI, &req);

        assert!(requests.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_duplicate_imps_not_deduplicated() {
        let req = request(vec![imp_with_tag("imp1", "tag1"), imp_with_tag("imp1", "tag1")]);
        let (requests, errors) = build_requests(URI, &req);

        assert!(errors.is_empty());
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_build_is_idempotent_and_leaves_source_untouched() {
        let req = request(vec![
            imp_with_tag("imp1", "tag1"),
            imp_with_ext("imp2", None),
            imp_with_tag("imp3", "tag3"),
        ]);
        let snapshot = req.clone();

        let (first, first_errors) = build_requests(URI, &req);
        let (second, second_errors) = build_requests(URI, &req);

        assert_eq!(first, second);
        assert_eq!(first_errors.len(), second_errors.len());
        assert_eq!(req, snapshot, "Source request must not be mutated");
        assert!(req.imp.iter().all(|imp| imp.tagid.is_none()));
    }

    #[test]
    fn test_encode_failure_is_serialization_error() {
        let err = encode_request(URI, &Unencodable, "imp1").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(err.to_string().contains("imp1"));
        assert!(err.to_string().contains("cannot encode"));
    }

    #[test]
    fn test_encode_failure_isolated_to_its_imp() {
        let req = request(vec![
            imp_with_tag("imp1", "tag1"),
            imp_with_tag("imp2", "tag2"),
            imp_with_tag("imp3", "tag3"),
        ]);

        let (requests, errors) = build_requests_with(URI, &req, |uri, single_req, imp_id| {
            if imp_id == "imp2" {
                encode_request(uri, &Unencodable, imp_id)
            } else {
                encode_request(uri, single_req, imp_id)
            }
        });

        let imp_ids: Vec<_> = requests.iter().map(|r| r.imp_id.as_str()).collect();
        assert_eq!(imp_ids, vec!["imp1", "imp3"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Serialization);
        assert!(errors[0].to_string().contains("imp2"));
    }

    #[test]
    fn test_empty_tag_forwarded() {
        let req = request(vec![imp_with_tag("imp1", "")]);
        let (requests, errors) = build_requests(URI, &req);

        assert!(errors.is_empty());
        assert_eq!(decode_body(&requests[0]).imp[0].tagid.as_deref(), Some(""));
    }

    #[test]
    fn test_unmodelled_fields_forwarded() {
        let req: BidRequest = serde_json::from_value(json!({
            "id": "r",
            "bcat": ["IAB25"],
            "imp": [{
                "id": "imp1",
                "instl": 1,
                "banner": {"w": 300, "h": 250, "btype": [4]},
                "video": {"mimes": ["video/mp4"], "placement": 1},
                "ext": {"bidder": {"TagID": "t1"}}
            }]
        }))
        .unwrap();

        let (requests, errors) = build_requests(URI, &req);
        assert!(errors.is_empty());

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

        assert_eq!(body["bcat"], json!(["IAB25"]));
        assert_eq!(body["imp"][0]["instl"], json!(1));
        assert_eq!(body["imp"][0]["banner"]["btype"], json!([4]));
        assert_eq!(body["imp"][0]["video"]["placement"], json!(1));
        assert_eq!(body["imp"][0]["tagid"], json!("t1"));
    }
}
