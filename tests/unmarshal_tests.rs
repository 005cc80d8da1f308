// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Unmarshal integration tests.
//!
//! Tests cover:
//! - Dispatch into values, boxes, sequences, records, maps and interfaces
//!   for every constructor result shape
//! - Parameter binding from the kind, raw bytes, decoded fields and context
//! - Error reporting for every failure class
//! - Sharing a registry between threads

mod common;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;

use common::{config, registry_with, Adapter, Config, Produces};
use kindcodec::decode::Arguments;
use kindcodec::registry::{Construct, ConstructError, ParamSource, ReturnShape, Signature};
use kindcodec::{
    record, BoxError, Cancellation, CodecError, Ctx, Decoder, Destination, ExtensionKey, Fields,
    Interface, Produced, Raw, Registry,
};

// ============================================================================
// Test Types
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Single {
    a: Config,
}

record!(Single { a });

#[derive(Debug, Default, PartialEq)]
struct SingleBoxed {
    a: Box<Config>,
}

record!(SingleBoxed { a });

#[derive(Debug, Default, PartialEq)]
struct Pair {
    a: Config,
    b: Vec<Config>,
}

record!(Pair { a, b });

#[derive(Debug, Default, PartialEq)]
struct PairBoxed {
    a: Box<Config>,
    b: Vec<Box<Config>>,
}

record!(PairBoxed { a, b });

fn boxed(name: &str) -> Box<Config> {
    Box::new(config(name))
}

// ============================================================================
// Dispatch Across Destination Shapes
// ============================================================================

#[test]
fn test_dispatch_into_value_and_box() {
    for produces in Produces::ALL {
        let registry = registry_with(produces);
        let decoder = Decoder::new(&registry);

        let value: Config = decoder.unmarshal(br#"{"@Kind":"hello1"}"#).unwrap();
        assert_eq!(value, config("hello1"), "{produces:?}");

        let value: Box<Config> = decoder.unmarshal(br#"{"@Kind":"hello1"}"#).unwrap();
        assert_eq!(value, boxed("hello1"), "{produces:?}");
    }
}

#[test]
fn test_dispatch_sequence_preserves_order() {
    for produces in Produces::ALL {
        let registry = registry_with(produces);
        let decoder = Decoder::new(&registry);
        let input = br#"[{"@Kind":"hello1"},{"@Kind":"hello2"}]"#;

        let values: Vec<Config> = decoder.unmarshal(input).unwrap();
        assert_eq!(values, vec![config("hello1"), config("hello2")], "{produces:?}");

        let values: Vec<Box<Config>> = decoder.unmarshal(input).unwrap();
        assert_eq!(values, vec![boxed("hello1"), boxed("hello2")], "{produces:?}");
    }
}

#[test]
fn test_dispatch_record_fields() {
    for produces in Produces::ALL {
        let registry = registry_with(produces);
        let decoder = Decoder::new(&registry);

        let single: Single = decoder.unmarshal(br#"{"A":{"@Kind":"hello1"}}"#).unwrap();
        assert_eq!(single.a, config("hello1"), "{produces:?}");

        let single: SingleBoxed = decoder.unmarshal(br#"{"A":{"@Kind":"hello1"}}"#).unwrap();
        assert_eq!(single.a, boxed("hello1"), "{produces:?}");

        let input = br#"{"A":{"@Kind":"hello1"},"B":[{"@Kind":"hello2"},{"@Kind":"hello3"}]}"#;
        let pair: Pair = decoder.unmarshal(input).unwrap();
        assert_eq!(
            pair,
            Pair {
                a: config("hello1"),
                b: vec![config("hello2"), config("hello3")],
            },
            "{produces:?}"
        );

        let pair: PairBoxed = decoder.unmarshal(input).unwrap();
        assert_eq!(
            pair,
            PairBoxed {
                a: boxed("hello1"),
                b: vec![boxed("hello2"), boxed("hello3")],
            },
            "{produces:?}"
        );
    }
}

#[test]
fn test_dispatch_map_values_keep_key_case() {
    for produces in Produces::ALL {
        let registry = registry_with(produces);
        let decoder = Decoder::new(&registry);
        let input = br#"{"name":{"@Kind":"hello1"},"Name2":{"@Kind":"hello2"}}"#;

        let map: HashMap<String, Config> = decoder.unmarshal(input).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["name"], config("hello1"), "{produces:?}");
        assert_eq!(map["Name2"], config("hello2"), "{produces:?}");

        let map: BTreeMap<String, Box<Config>> = decoder.unmarshal(input).unwrap();
        assert_eq!(map["Name2"], boxed("hello2"), "{produces:?}");
    }
}

#[test]
fn test_dispatch_into_interface() {
    let expected = [
        (Produces::Value, "hello1"),
        (Produces::Boxed, "boxed hello1"),
        (Produces::InterfaceValue, "hello1"),
        (Produces::InterfaceBoxed, "boxed hello1"),
    ];
    for (produces, label) in expected {
        let registry = registry_with(produces);
        let decoder = Decoder::new(&registry);

        let value: Interface<dyn Adapter> = decoder.unmarshal(br#"{"@kind":"hello1"}"#).unwrap();
        assert_eq!(value.get().map(|a| a.label()).as_deref(), Some(label), "{produces:?}");

        let values: Vec<Interface<dyn Adapter>> = decoder
            .unmarshal(br#"[{"@kind":"hello2"}, null]"#)
            .unwrap();
        assert_eq!(values.len(), 2);
        assert!(values[1].is_none());
    }
}

#[test]
fn test_interface_declaration_order_does_not_matter() {
    let box_first = Registry::new();
    box_first
        .implement::<Box<Config>, dyn Adapter>(|c| c)
        .unwrap();
    box_first.implement::<Config, dyn Adapter>(|c| c).unwrap();

    let value_first = Registry::new();
    value_first.implement::<Config, dyn Adapter>(|c| c).unwrap();
    value_first
        .implement::<Box<Config>, dyn Adapter>(|c| c)
        .unwrap();

    for registry in [box_first, value_first] {
        registry
            .register_infallible("boxed", |name: String| Box::new(Config { name }))
            .unwrap();
        registry
            .register_infallible("plain", |name: String| Config { name })
            .unwrap();
        let decoder = Decoder::new(&registry);

        let value: Interface<dyn Adapter> = decoder.unmarshal(br#"{"@kind":"boxed"}"#).unwrap();
        assert_eq!(value.get().map(|a| a.label()).as_deref(), Some("boxed boxed"));

        let value: Interface<dyn Adapter> = decoder.unmarshal(br#"{"@kind":"plain"}"#).unwrap();
        assert_eq!(value.get().map(|a| a.label()).as_deref(), Some("plain"));
    }
}

#[test]
fn test_two_kinds_same_type() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);
    let values: [Config; 3] = decoder
        .unmarshal(br#"[{"@kind":"hello3"},{"@kind":"hello1"},{"@kind":"hello2"}]"#)
        .unwrap();
    assert_eq!(values, [config("hello3"), config("hello1"), config("hello2")]);
}

// ============================================================================
// Discriminator Handling
// ============================================================================

#[test]
fn test_tag_matched_case_insensitively() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);
    for input in [r#"{"@kind":"hello1"}"#, r#"{"@KIND":"hello1"}"#, r#"{"@Kind":"hello1"}"#] {
        let value: Config = decoder.unmarshal(input.as_bytes()).unwrap();
        assert_eq!(value, config("hello1"));
    }
}

#[test]
fn test_kind_is_case_sensitive() {
    let registry = registry_with(Produces::Value);
    let err = Decoder::new(&registry)
        .unmarshal::<Config>(br#"{"@kind":"HELLO1"}"#)
        .unwrap_err();
    assert!(matches!(err, CodecError::KindNotRegistered { ref kind, .. } if kind == "HELLO1"));
}

#[test]
fn test_non_string_or_empty_tag_decodes_structurally() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);

    let value: Config = decoder.unmarshal(br#"{"@kind":5,"name":"plain"}"#).unwrap();
    assert_eq!(value, config("plain"));

    let value: Config = decoder.unmarshal(br#"{"@kind":"","name":"empty"}"#).unwrap();
    assert_eq!(value, config("empty"));
}

#[test]
fn test_custom_tag() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::builder(&registry).tag("type").build().unwrap();

    let value: Config = decoder.unmarshal(br#"{"Type":"hello2"}"#).unwrap();
    assert_eq!(value, config("hello2"));

    let value: Config = decoder
        .unmarshal(br#"{"@kind":"hello2","name":"ignored tag"}"#)
        .unwrap();
    assert_eq!(value, config("ignored tag"));
}

#[test]
fn test_tag_inside_scalar_or_array_is_not_dispatched() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);
    let value: String = decoder.unmarshal(br#""{\"@kind\":\"hello1\"}""#).unwrap();
    assert_eq!(value, r#"{"@kind":"hello1"}"#);
}

// ============================================================================
// Full Replace
// ============================================================================

#[test]
fn test_dispatch_replaces_destination() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);

    let mut values = vec![config("stale1"), config("stale2"), config("stale3")];
    decoder
        .unmarshal_into(br#"[{"@kind":"hello1"}]"#, &mut values)
        .unwrap();
    assert_eq!(values, vec![config("hello1")]);

    let mut pair = Pair {
        a: config("stale"),
        b: vec![config("stale")],
    };
    decoder
        .unmarshal_into(br#"{"b":[{"@kind":"hello2"}]}"#, &mut pair)
        .unwrap();
    assert_eq!(
        pair,
        Pair {
            a: Config::default(),
            b: vec![config("hello2")],
        }
    );
}

#[test]
fn test_duplicate_keys_last_wins() {
    let registry = Registry::new();
    let decoder = Decoder::new(&registry);

    let value: Config = decoder
        .unmarshal(br#"{"name":"first","name":"second"}"#)
        .unwrap();
    assert_eq!(value, config("second"));

    let value: Config = decoder
        .unmarshal(br#"{"name":"first","NAME":"second"}"#)
        .unwrap();
    assert_eq!(value, config("second"));
}

// ============================================================================
// Parameter Binding
// ============================================================================

struct Region;

impl ExtensionKey for Region {
    const NAME: &'static str = "region";
    type Value = String;
}

#[derive(Debug, Default, PartialEq)]
struct Listener {
    host: String,
    port: u16,
    upstream: Option<Config>,
}

record!(Listener {
    host,
    port: string,
    upstream,
});

#[test]
fn test_fields_param_decodes_same_object() {
    let registry = registry_with(Produces::Value);
    registry
        .register(
            "listener",
            |kind: String, fields: Fields<Listener>| -> Result<(String, Listener), BoxError> {
                Ok((kind, fields.into_inner()))
            },
        )
        .unwrap_err();
    registry
        .register(
            "listener",
            |kind: String, fields: Fields<Listener>| -> Result<Listener, BoxError> {
                let mut listener = fields.into_inner();
                listener.host = format!("{kind}:{}", listener.host);
                Ok(listener)
            },
        )
        .unwrap();

    let listener: Listener = Decoder::new(&registry)
        .unmarshal(br#"{"@kind":"listener","host":"local","port":"8080","upstream":{"@kind":"hello1"}}"#)
        .unwrap();
    assert_eq!(
        listener,
        Listener {
            host: "listener:local".to_string(),
            port: 8080,
            upstream: Some(config("hello1")),
        }
    );
}

#[test]
fn test_boxed_record_param_decodes_same_object() {
    let registry = registry_with(Produces::Value);
    registry
        .register_infallible("boxed_listener", |kind: String, fields: Box<Listener>| {
            let mut listener = *fields;
            listener.host = format!("{kind}/{}", listener.host);
            listener
        })
        .unwrap();

    let listener: Box<Listener> = Decoder::new(&registry)
        .unmarshal(br#"{"@kind":"boxed_listener","host":"x","port":"9","upstream":{"@kind":"hello3"}}"#)
        .unwrap();
    assert_eq!(
        *listener,
        Listener {
            host: "boxed_listener/x".to_string(),
            port: 9,
            upstream: Some(config("hello3")),
        }
    );

    registry
        .register_infallible("boxed_config", |kind: String, fields: Box<Config>| Config {
            name: format!("{kind}/{}", fields.name),
        })
        .unwrap();
    let value: Config = Decoder::new(&registry)
        .unmarshal(br#"{"@kind":"boxed_config","name":"x"}"#)
        .unwrap();
    assert_eq!(value, config("boxed_config/x"));
}

#[test]
fn test_raw_and_map_params() {
    let registry = Registry::new();
    registry
        .register_infallible("raw", |raw: Raw| {
            config(&String::from_utf8_lossy(&raw))
        })
        .unwrap();
    registry
        .register_infallible("count", |entries: HashMap<String, serde_json::Value>| {
            config(&entries.len().to_string())
        })
        .unwrap();
    let decoder = Decoder::new(&registry);

    let value: Config = decoder.unmarshal(br#"  {"@kind":"raw", "x": 1}  "#).unwrap();
    assert_eq!(value, config(r#"{"@kind":"raw", "x": 1}"#));

    let value: Config = decoder
        .unmarshal(br#"{"@kind":"count","a":1,"b":[2]}"#)
        .unwrap();
    assert_eq!(value, config("3"));
}

#[test]
fn test_context_params() {
    let registry = Registry::new();
    registry
        .register_infallible(
            "ctx",
            |region: Ctx<Region>, destination: Destination, cancel: Cancellation| {
                config(&format!(
                    "{}|{}|{}",
                    *region,
                    destination.0.rsplit("::").next().unwrap_or_default(),
                    cancel.is_cancelled()
                ))
            },
        )
        .unwrap();

    let decoder = Decoder::builder(&registry)
        .extension::<Region>("eu-west".to_string())
        .build()
        .unwrap();
    let value: Config = decoder.unmarshal(br#"{"@kind":"ctx"}"#).unwrap();
    assert_eq!(value, config("eu-west|Config|false"));
}

#[test]
fn test_missing_context_value() {
    let registry = Registry::new();
    registry
        .register_infallible("ctx", |_name: String, region: Ctx<Region>| {
            config(&region.into_inner())
        })
        .unwrap();

    let err = Decoder::new(&registry)
        .unmarshal::<Config>(br#"{"@kind":"ctx"}"#)
        .unwrap_err();
    match err {
        CodecError::ParameterResolution {
            kind,
            position,
            type_name,
            reason,
        } => {
            assert_eq!(kind, "ctx");
            assert_eq!(position, 1);
            assert!(type_name.contains("Ctx"));
            assert!(reason.contains("region"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cancellation_is_constructor_responsibility() {
    let registry = Registry::new();
    registry
        .register("slow", |cancel: Cancellation| -> Result<Config, BoxError> {
            if cancel.is_cancelled() {
                return Err("cancelled".into());
            }
            Ok(config("done"))
        })
        .unwrap();

    let cancellation = Cancellation::new();
    let decoder = Decoder::builder(&registry)
        .cancellation(cancellation.clone())
        .build()
        .unwrap();

    assert_eq!(
        decoder.unmarshal::<Config>(br#"{"@kind":"slow"}"#).unwrap(),
        config("done")
    );

    cancellation.cancel();
    let err = decoder.unmarshal::<Config>(br#"{"@kind":"slow"}"#).unwrap_err();
    assert!(matches!(err, CodecError::ConstructorInvocation { .. }));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_kind_not_registered_names_destination_and_path() {
    let registry = registry_with(Produces::Value);
    let err = Decoder::new(&registry)
        .unmarshal::<Pair>(br#"{"b":[{"@kind":"hello1"},{"@kind":"missing"}]}"#)
        .unwrap_err();
    match err {
        CodecError::KindNotRegistered {
            kind,
            expected,
            path,
        } => {
            assert_eq!(kind, "missing");
            assert!(expected.ends_with("Config"));
            assert_eq!(path, "$.b[1]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_constructor_error_keeps_source() {
    let registry = Registry::new();
    registry
        .register("broken", |_name: String| -> Result<Config, anyhow::Error> {
            Err(anyhow::anyhow!("disk on fire"))
        })
        .unwrap();

    let err = Decoder::new(&registry)
        .unmarshal::<Config>(br#"{"@kind":"broken","x":1}"#)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken"));
    assert!(message.contains("disk on fire"));
    match &err {
        CodecError::ConstructorInvocation { excerpt, source, .. } => {
            assert!(excerpt.contains("broken"));
            assert_eq!(source.to_string(), "disk on fire");
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct Silent;

impl Construct for Silent {
    fn signature(&self) -> Signature {
        Signature {
            params: Vec::new(),
            produces: "Config",
            returns: ReturnShape::Value,
        }
    }

    fn construct(&self, _args: Arguments) -> Result<Option<Produced>, ConstructError> {
        Ok(None)
    }
}

#[test]
fn test_constructor_contract_violation() {
    let registry = Registry::new();
    registry.register_entry("silent", Arc::new(Silent)).unwrap();
    let err = Decoder::new(&registry)
        .unmarshal::<Config>(br#"{"@kind":"silent"}"#)
        .unwrap_err();
    assert!(matches!(err, CodecError::ConstructorContractViolation { ref kind } if kind == "silent"));
}

#[test]
fn test_cannot_adapt_unrelated_type() {
    let registry = Registry::new();
    registry.register_infallible("number", || 42u32).unwrap();
    let err = Decoder::new(&registry)
        .unmarshal::<Config>(br#"{"@kind":"number"}"#)
        .unwrap_err();
    assert!(err.is_type_adaptation());
    match err {
        CodecError::CannotAdapt {
            produced, expected, ..
        } => {
            assert_eq!(produced, "u32");
            assert!(expected.ends_with("Config"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_interface_not_satisfied() {
    let registry = common::adapter_registry();
    registry
        .register_infallible("text", |name: String| name)
        .unwrap();
    let err = Decoder::new(&registry)
        .unmarshal::<Interface<dyn Adapter>>(br#"{"@kind":"text"}"#)
        .unwrap_err();
    assert!(err.is_type_adaptation());
    assert!(matches!(err, CodecError::InterfaceNotSatisfied { .. }));
    assert!(err.to_string().contains("Adapter"));
}

#[test]
fn test_malformed_input() {
    let registry = registry_with(Produces::Value);
    let decoder = Decoder::new(&registry);

    for input in [&b""[..], b"   ", b"{\"name\":", b"[1,", b"{\"name\" 1}"] {
        let err = decoder.unmarshal::<Config>(input).unwrap_err();
        assert!(
            matches!(err, CodecError::MalformedInput { .. }),
            "{input:?}: {err}"
        );
    }

    let err = decoder.unmarshal::<Config>(b"[1, 2]").unwrap_err();
    assert!(matches!(err, CodecError::MalformedInput { .. }));

    let err = decoder.unmarshal::<Vec<Config>>(br#"{"name":"x"}"#).unwrap_err();
    assert!(matches!(err, CodecError::MalformedInput { .. }));
}

#[test]
fn test_error_inside_fields_param() {
    let registry = Registry::new();
    registry
        .register_infallible("listener", |fields: Fields<Listener>| fields.into_inner())
        .unwrap();
    let err = Decoder::new(&registry)
        .unmarshal::<Listener>(br#"{"@kind":"listener","port":"high"}"#)
        .unwrap_err();
    match err {
        CodecError::MalformedInput { path, .. } => assert_eq!(path, "$.port"),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Concurrency and Global Registry
// ============================================================================

#[test]
fn test_concurrent_decoding() {
    let registry = Arc::new(registry_with(Produces::Boxed));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let decoder = Decoder::new(&registry);
                for _ in 0..25 {
                    let values: Vec<Config> = decoder
                        .unmarshal(br#"[{"@kind":"hello1"},{"@kind":"hello2"}]"#)
                        .unwrap();
                    assert_eq!(values.len(), 2, "thread {i}");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_global_registry() {
    kindcodec::register("unmarshal_tests@global", |name: String| -> Result<Config, BoxError> {
        Ok(Config { name })
    })
    .unwrap();

    let value: Config = kindcodec::unmarshal(br#"{"@kind":"unmarshal_tests@global"}"#).unwrap();
    assert_eq!(value, config("unmarshal_tests@global"));

    let mut values: Vec<Config> = Vec::new();
    kindcodec::unmarshal_into(br#"[{"@kind":"unmarshal_tests@global"}]"#, &mut values).unwrap();
    assert_eq!(values.len(), 1);
}

#[test]
fn test_source_of_declared_params() {
    let registry = Registry::new();
    registry
        .register(
            "sig",
            |_: String, _: Raw, _: Fields<Config>, _: Cancellation| -> Result<Config, BoxError> {
                Ok(Config::default())
            },
        )
        .unwrap();
    let entry = registry.find("sig").unwrap();
    let sources: Vec<String> = entry
        .signature()
        .params
        .iter()
        .map(|p| p.source.to_string())
        .collect();
    assert_eq!(sources[0], "kind");
    assert_eq!(sources[1], "raw fragment");
    assert!(sources[2].starts_with("decoded "));
    assert_eq!(sources[3], "context cancellation");
    assert!(matches!(entry.signature().params[0].source, ParamSource::Kind));
}
