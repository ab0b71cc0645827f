//! Host name template rendering.

use crate::error::EndpointError;

/// Render a host template of the form `{service}.{region}.{dnsSuffix}`.
///
/// `lookup` returns the value for a variable name; unknown variables fail with
/// [`EndpointError::UnresolvedVariable`].
pub fn render_host_template<'a>(
    template: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<String, EndpointError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| EndpointError::MalformedTemplate(template.to_owned()))?;
        let name = &after[..end];
        if name.is_empty() || name.contains('{') {
            return Err(EndpointError::MalformedTemplate(template.to_owned()));
        }
        let value = lookup(name).ok_or_else(|| EndpointError::UnresolvedVariable(name.to_owned()))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    if rest.contains('}') {
        return Err(EndpointError::MalformedTemplate(template.to_owned()));
    }
    out.push_str(rest);

    Ok(out)
}
