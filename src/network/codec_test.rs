use std::collections::HashMap;
use std::collections::HashSet;

use crate::network::decode;
use crate::network::encode;
use crate::proto::Request;
use crate::proto::Response;
use crate::proto::UpdateMetadata;
use crate::FieldValue;

#[test]
fn test_request_frames_survive_encode_decode() {
    let request = Request::Publish {
        secret: Some("s3cret".to_string()),
        entity: "u1".to_string(),
        updates: HashMap::from([("ssh_key".to_string(), FieldValue::from("key-A"))]),
    };

    let payload = encode(&request).unwrap();
    let decoded: Request = decode(&payload).unwrap();

    match decoded {
        Request::Publish {
            secret,
            entity,
            updates,
        } => {
            assert_eq!(secret.as_deref(), Some("s3cret"));
            assert_eq!(entity, "u1");
            assert_eq!(updates["ssh_key"], FieldValue::from("key-A"));
        }
        other => panic!("unexpected decode result: {:?}", other),
    }
}

#[test]
fn test_delivery_frame_carries_snapshot_and_metadata() {
    let response = Response::Delivery {
        entities: HashMap::from([(
            "u1".to_string(),
            HashMap::from([("ssh_key".to_string(), FieldValue::from("key-A"))]),
        )]),
        metadata: UpdateMetadata {
            revision: 42,
            changed_fields: HashSet::from(["ssh_key".to_string()]),
        },
    };

    let payload = encode(&response).unwrap();
    let decoded: Response = decode(&payload).unwrap();

    match decoded {
        Response::Delivery { entities, metadata } => {
            assert_eq!(metadata.revision, 42);
            assert!(metadata.changed_fields.contains("ssh_key"));
            assert_eq!(entities["u1"]["ssh_key"], FieldValue::from("key-A"));
        }
        other => panic!("unexpected decode result: {:?}", other),
    }
}

#[test]
fn test_truncated_payload_is_an_error_not_a_panic() {
    let payload = encode(&Request::Ping).unwrap();
    let truncated = &payload[..payload.len().saturating_sub(1)];
    assert!(decode::<Request>(truncated).is_err());
}
