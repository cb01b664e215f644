/// Expands a comma-separated permission string into the `text_recieved`
/// values a role-restricted admin may see.
///
/// Each element `e` contributes `He`, `Ee`, `Me`, `e` and the single combined
/// token `He,Me,Ee`. Elements are trimmed and empty ones skipped.
pub fn expand_permission_tokens(permission: &str) -> Vec<String> {
    permission
        .split(',')
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .flat_map(|e| {
            [
                format!("H{e}"),
                format!("E{e}"),
                format!("M{e}"),
                e.to_string(),
                format!("H{e},M{e},E{e}"),
            ]
        })
        .collect()
}
