/// Creates a root span based on the provided sampling rate.
/// Sampling is a pre-filter here: an unsampled batch never pays for
/// span context collection in any of the child spans below it.
///
/// # Arguments
/// * `sample_percent` - The percent (0.0 to 1.0) of spans to sample
/// * `span_name` - The name of the span if created (must be a literal)
///
/// # Behavior
/// - If a parent span exists (is active): ALWAYS creates a child span
/// - If no parent exists: Makes sampling decision at the configured rate
///
/// # Example
/// ```ignore
/// let span = sample_or_attach_root_span!(0.01, "sonobi_callouts");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! sample_or_attach_root_span {
    ($sample_percent:expr, $span_name:literal) => {{
        let current = ::tracing::Span::current();

        if !current.is_disabled() || ::rand::random::<f32>() < $sample_percent {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// Creates a DEBUG-level child span only if the parent span is active (sampled).
///
/// # Returns
/// An **un-entered** `Span` - you must call `.entered()` or use `.instrument()`.
///
/// # Example
/// ```ignore
/// let span = child_span_debug!("sonobi_build_requests", imp_count = req.imp.len());
/// let _enter = span.entered();
/// ```
#[macro_export]
macro_rules! child_span_debug {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::debug_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}

/// Creates an INFO-level child span only if the parent span is active (sampled).
///
/// # Returns
/// An **un-entered** `Span` - you must call `.entered()` or use `.instrument()`.
///
/// # Example
/// ```ignore
/// let span = child_span_info!("sonobi_callout", imp = %req.imp_id);
/// transport.execute(&req).instrument(span).await;
/// ```
#[macro_export]
macro_rules! child_span_info {
    ($span_name:literal) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name)
        } else {
            ::tracing::Span::none()
        }
    }};
    ($span_name:literal, $($fields:tt)*) => {{
        if !::tracing::Span::current().is_disabled() {
            ::tracing::info_span!($span_name, $($fields)*)
        } else {
            ::tracing::Span::none()
        }
    }};
}
