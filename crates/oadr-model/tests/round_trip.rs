//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use oadr_model::{
    decode, decode_as, decode_value, encode, DecodeOptions, Entity, Event, Interval, Notification,
    ObjectType, OpenAdrObject, PayloadType, Program, Report, Resource, Subscription, ToJson,
    ValuesMap, VirtualEndNode,
};
use serde_json::{json, Value};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Decode, re-encode and decode again; both the document and the value must
/// survive unchanged.
fn assert_round_trip(doc: Value) -> OpenAdrObject {
    let object = decode(&doc).expect("decode");
    assert_eq!(encode(&object), doc);
    let again = decode(&encode(&object)).expect("decode re-encoded");
    assert_eq!(again, object);
    assert_eq!(hash_of(&again), hash_of(&object));
    object
}

fn maximal_program() -> Value {
    json!({
        "objectType": "PROGRAM",
        "id": "program-1",
        "createdDateTime": "2024-06-01T08:00:00.000Z",
        "modificationDateTime": "2024-06-01T09:30:00.000Z",
        "programName": "Winter Peak",
        "programLongName": "Winter Peak Pricing",
        "retailerName": "ACME",
        "retailerLongName": "ACME Energy",
        "programType": "PRICING_TARIFF",
        "country": "US",
        "principalSubdivision": "CA",
        "timeZoneOffset": "PT1H",
        "intervalPeriod": {"start": "2024-06-01T00:00:00.000Z", "duration": "P1D", "randomizeStart": "PT5M"},
        "programDescriptions": [{"URL": "https://acme.example.com/programs/winter"}],
        "bindingEvents": true,
        "localPrice": false,
        "payloadDescriptors": [
            {"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "units": "KWH", "currency": "USD"},
            {
                "objectType": "REPORT_PAYLOAD_DESCRIPTOR",
                "payloadType": "USAGE",
                "readingType": "DIRECT_READ",
                "units": "KWH",
                "accuracy": 0.5,
                "confidence": 90
            }
        ],
        "targets": [{"type": "GROUP", "values": ["north"]}]
    })
}

fn maximal_event() -> Value {
    json!({
        "objectType": "EVENT",
        "id": "event-1",
        "createdDateTime": "2024-06-01T08:00:00.000Z",
        "programID": "program-1",
        "eventName": "evening peak",
        "priority": 2,
        "targets": [{"type": "VEN_NAME", "values": ["ven-a", "ven-b"]}],
        "reportDescriptors": [{
            "payloadType": "USAGE",
            "readingType": "DIRECT_READ",
            "units": "KWH",
            "targets": [{"type": "RESOURCE_NAME", "values": ["battery"]}],
            "aggregate": true,
            "startInterval": 0,
            "numIntervals": 4,
            "historical": false,
            "frequency": 15,
            "repeat": 2
        }],
        "payloadDescriptors": [{"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "currency": "EUR"}],
        "intervalPeriod": {"start": "2024-06-01T17:00:00.000Z", "duration": "PT1H"},
        "intervals": [
            {"id": 0, "payloads": [{"type": "PRICE", "values": [0.17]}]},
            {
                "id": 1,
                "intervalPeriod": {"start": "2024-06-01T18:00:00.000Z", "duration": "PT30M"},
                "payloads": [{"type": "PRICE", "values": [0.21]}, {"type": "SIMPLE", "values": [1, 2]}]
            }
        ]
    })
}

fn maximal_report() -> Value {
    json!({
        "objectType": "REPORT",
        "id": "report-1",
        "programID": "program-1",
        "eventID": "event-1",
        "clientName": "ven-a",
        "reportName": "usage for evening peak",
        "payloadDescriptors": [{"objectType": "REPORT_PAYLOAD_DESCRIPTOR", "payloadType": "USAGE", "units": "KWH"}],
        "resources": [{
            "resourceName": "battery",
            "intervalPeriod": {"start": "2024-06-01T17:00:00.000Z", "duration": "PT1H"},
            "intervals": [{"id": 0, "payloads": [{"type": "USAGE", "values": [12.5]}]}]
        }]
    })
}

fn maximal_subscription() -> Value {
    json!({
        "objectType": "SUBSCRIPTION",
        "id": "subscription-1",
        "clientName": "ven-a",
        "programID": "program-1",
        "objectOperations": [{
            "objects": ["EVENT", "PROGRAM"],
            "operations": ["POST", "PUT"],
            "callbackUrl": "https://ven-a.example.com/notify",
            "bearerToken": "secret"
        }],
        "targets": [{"type": "GROUP", "values": ["north"]}]
    })
}

fn maximal_ven() -> Value {
    json!({
        "objectType": "VEN",
        "id": "ven-1",
        "venName": "ven-a",
        "attributes": [{"type": "LOCATION", "values": [{"x": 1.5, "y": -2.25}]}],
        "targets": [{"type": "GROUP", "values": ["north"]}],
        "resources": [{
            "objectType": "RESOURCE",
            "id": "resource-1",
            "resourceName": "battery",
            "venID": "ven-1",
            "attributes": [{"type": "MAX_POWER_EXPORT", "values": [5]}]
        }]
    })
}

#[test]
fn minimal_objects_round_trip() {
    for doc in [
        json!({"objectType": "PROGRAM", "programName": "p"}),
        json!({"objectType": "EVENT", "programID": "p", "intervals": []}),
        json!({"objectType": "REPORT", "programID": "p", "eventID": "e", "clientName": "c"}),
        json!({"objectType": "SUBSCRIPTION", "clientName": "c", "programID": "p", "objectOperations": []}),
        json!({"objectType": "VEN", "venName": "v"}),
        json!({"objectType": "RESOURCE", "resourceName": "r"}),
    ] {
        assert_round_trip(doc);
    }
}

#[test]
fn maximal_objects_round_trip() {
    let program = assert_round_trip(maximal_program());
    assert_eq!(program.object_type(), ObjectType::PROGRAM);
    assert_eq!(program.as_kind::<Program>().map(|p| p.payload_descriptors().len()), Some(2));

    let event = assert_round_trip(maximal_event());
    assert_eq!(event.as_kind::<Event>().map(|e| e.intervals().len()), Some(2));

    let report = assert_round_trip(maximal_report());
    assert_eq!(report.as_kind::<Report>().map(Report::client_name), Some("ven-a"));

    let subscription = assert_round_trip(maximal_subscription());
    let operations = subscription.as_kind::<Subscription>().expect("subscription").object_operations();
    assert!(operations.iter().all(|op| op.matches(&ObjectType::EVENT, &oadr_model::Operation::PUT)));

    let ven = assert_round_trip(maximal_ven());
    let battery = ven.as_kind::<VirtualEndNode>().and_then(|v| v.resource("battery"));
    assert_eq!(battery.and_then(|r| r.ven_id()).map(|id| id.as_str()), Some("ven-1"));
}

#[test]
fn typed_decode_matches_sum_decode() {
    let options = DecodeOptions::default();
    let typed = decode_as::<Event>(&maximal_event(), &options).expect("typed");
    let any = decode(&maximal_event()).expect("any");
    assert_eq!(typed.clone().upcast(), any);
    assert_eq!(any.downcast::<Event>().expect("event"), typed);
}

#[test]
fn resource_standalone_and_nested_are_the_same_value() {
    let ven = decode_as::<VirtualEndNode>(&maximal_ven(), &DecodeOptions::default()).expect("ven");
    let nested = ven.resource("battery").expect("nested resource").clone();
    let standalone = decode_as::<Resource>(&maximal_ven()["resources"][0], &DecodeOptions::default())
        .expect("standalone");
    assert_eq!(nested, standalone);
}

#[test]
fn set_fields_ignore_order_and_duplicates() {
    let mut reordered = maximal_event();
    let intervals = reordered["intervals"].as_array().cloned().expect("intervals");
    reordered["intervals"] = Value::Array(intervals.iter().rev().cloned().collect());
    let original = decode(&maximal_event()).expect("original");
    let permuted = decode(&reordered).expect("permuted");
    assert_eq!(original, permuted);
    assert_eq!(hash_of(&original), hash_of(&permuted));

    let mut doubled = maximal_program();
    doubled["targets"] = json!([{"type": "GROUP", "values": ["north"]}, {"type": "group", "values": ["north"]}]);
    let program = decode(&doubled).expect("program");
    assert_eq!(program, decode(&maximal_program()).expect("program"));
    assert_eq!(program.as_kind::<Program>().map(|p| p.targets().len()), Some(1));
}

#[test]
fn list_fields_keep_order() {
    let mut swapped = maximal_event();
    swapped["intervals"][1]["payloads"] =
        json!([{"type": "SIMPLE", "values": [1, 2]}, {"type": "PRICE", "values": [0.21]}]);
    assert_ne!(decode(&swapped).expect("swapped"), decode(&maximal_event()).expect("event"));

    let a = ValuesMap::of(PayloadType::SIMPLE, [1, 2]);
    let b = ValuesMap::of(PayloadType::SIMPLE, [2, 1]);
    assert_ne!(a, b);
}

#[test]
fn identity_header_takes_part_in_equality() {
    let mut anonymous = maximal_program();
    anonymous.as_object_mut().expect("object").remove("id");
    assert_ne!(decode(&anonymous).expect("anonymous"), decode(&maximal_program()).expect("program"));
}

#[test]
fn identifiers_and_enums_compare_without_case() {
    let mut shouted = maximal_subscription();
    shouted["programID"] = json!("PROGRAM-1");
    shouted["objectOperations"][0]["operations"] = json!(["post", "put"]);
    assert_eq!(decode(&shouted).expect("shouted"), decode(&maximal_subscription()).expect("subscription"));
}

#[test]
fn price_notification_scenario() {
    let doc = json!({
        "objectType": "EVENT",
        "operation": "POST",
        "object": {
            "programID": "program-1",
            "intervals": [{"id": 0, "payloads": [{"type": "PRICE", "values": [0.17]}]}]
        }
    });
    let notification: Notification = decode_value(&doc, &DecodeOptions::default()).expect("notification");
    let event = notification.object_as::<Event>().expect("event body");
    let interval: &Interval = event.intervals().iter().next().expect("interval");
    assert_eq!(interval.payloads(), &[ValuesMap::decimals(PayloadType::PRICE, [0.17]).expect("finite")]);

    let encoded = notification.to_json();
    assert_eq!(encoded["object"]["objectType"], json!("EVENT"));
    let again: Notification = decode_value(&encoded, &DecodeOptions::default()).expect("again");
    assert_eq!(again, notification);
}

#[test]
fn built_values_equal_decoded_values() {
    let built = Entity::new(
        Program::builder("Winter Peak")
            .retailer_name("ACME")
            .local_price(true)
            .target(ValuesMap::of(PayloadType::GROUP, ["north"]))
            .build(),
    );
    let decoded = decode_as::<Program>(
        &json!({
            "objectType": "PROGRAM",
            "programName": "Winter Peak",
            "retailerName": "ACME",
            "localPrice": true,
            "targets": [{"type": "GROUP", "values": ["north"]}]
        }),
        &DecodeOptions::default(),
    )
    .expect("program");
    assert_eq!(built, decoded);
    assert_eq!(hash_of(&built), hash_of(&decoded));
}

#[test]
fn serde_goes_through_the_wire_codec() {
    let object = decode(&maximal_report()).expect("report");
    let text = serde_json::to_string(&object).expect("serialize");
    let back: OpenAdrObject = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, object);
}
