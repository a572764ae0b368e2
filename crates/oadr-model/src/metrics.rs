//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Prometheus counters for codec activity, registered lazily in the default registry.
//!
//! With the `metrics` feature disabled every recorder compiles to a no-op.

#[cfg(feature = "metrics")]
mod counters {
    use once_cell::sync::Lazy;
    use prometheus::{register_int_counter_vec, IntCounterVec};

    pub(super) static DECODE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "oadr_decode_total",
            "Documents decoded successfully, by object kind",
            &["kind"]
        )
        .expect("metric registration to succeed")
    });

    pub(super) static DECODE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "oadr_decode_failures_total",
            "Documents rejected by the decoder, by object kind",
            &["kind"]
        )
        .expect("metric registration to succeed")
    });

    pub(super) static ENUM_REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "oadr_enum_registrations_total",
            "Open enumeration values first seen at runtime",
            &["enum"]
        )
        .expect("metric registration to succeed")
    });

    pub(super) static SKIPPED_ELEMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "oadr_skipped_elements_total",
            "Collection elements dropped under the skip policy",
            &["field"]
        )
        .expect("metric registration to succeed")
    });
}

/// Record the outcome of one top-level decode.
pub fn record_decode(kind: &str, success: bool) {
    #[cfg(feature = "metrics")]
    {
        let counter = if success {
            &counters::DECODE_TOTAL
        } else {
            &counters::DECODE_FAILURES_TOTAL
        };
        counter.with_label_values(&[kind]).inc();
    }
    #[cfg(not(feature = "metrics"))]
    let _ = (kind, success);
}

/// Record a value added to an open enumeration registry after start-up.
pub fn record_enum_registration(enumeration: &str) {
    #[cfg(feature = "metrics")]
    counters::ENUM_REGISTRATIONS_TOTAL
        .with_label_values(&[enumeration])
        .inc();
    #[cfg(not(feature = "metrics"))]
    let _ = enumeration;
}

/// Record a collection element dropped by [`crate::UnknownVariantPolicy::Skip`].
pub fn record_skipped_element(field: &str) {
    #[cfg(feature = "metrics")]
    counters::SKIPPED_ELEMENTS_TOTAL
        .with_label_values(&[field])
        .inc();
    #[cfg(not(feature = "metrics"))]
    let _ = field;
}

/// Current value of a decode counter.
#[cfg(all(test, feature = "metrics"))]
pub(crate) fn decode_count(kind: &str, success: bool) -> u64 {
    let counter = if success {
        &counters::DECODE_TOTAL
    } else {
        &counters::DECODE_FAILURES_TOTAL
    };
    counter.with_label_values(&[kind]).get()
}
