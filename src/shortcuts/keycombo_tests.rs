use super::*;

#[test]
fn parse_sorts_and_lowercases_modifiers() {
    let combo = parse_key_combo("Shift + CTRL + k");
    assert_eq!(
        combo.modifiers.iter().copied().collect::<Vec<_>>(),
        vec![Modifier::Ctrl, Modifier::Shift]
    );
    assert_eq!(combo.key.as_deref(), Some("k"));
    assert_eq!(combo.to_canonical_string(), "ctrl+shift+k");
}

#[test]
fn parse_deduplicates_repeated_modifiers() {
    let combo = parse_key_combo("ctrl+ctrl+b");
    assert_eq!(combo.modifiers.len(), 1);
    assert!(combo.has(Modifier::Ctrl));
    assert_eq!(combo.key.as_deref(), Some("b"));
}

#[test]
fn cmd_is_an_alias_for_meta() {
    assert_eq!(normalize("cmd+shift+p"), "meta+shift+p");
    assert_eq!(normalize("shift+meta+p"), "meta+shift+p");
}

#[test]
fn last_non_modifier_token_wins() {
    let combo = parse_key_combo("ctrl+a+b");
    assert_eq!(combo.key.as_deref(), Some("b"));
    assert_eq!(combo.to_canonical_string(), "ctrl+b");
}

#[test]
fn empty_and_invalid_input_parse_to_empty_combo() {
    for raw in ["", "   ", "+", "ctrl+shift", "++"] {
        let combo = parse_key_combo(raw);
        assert!(combo.modifiers.is_empty(), "modifiers for {raw:?}");
        assert_eq!(combo.key, None, "key for {raw:?}");
        assert_eq!(normalize(raw), "");
    }
}

#[test]
fn normalize_is_idempotent() {
    for raw in ["J", "alt+Shift+ArrowUp", "meta+ctrl+alt+shift+x", "g i"] {
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn captured_meta_and_ctrl_collapse_to_ctrl() {
    let captured = CapturedKey::new("K").ctrl().meta();
    assert_eq!(captured.to_canonical_string(), "ctrl+k");

    let meta_only = CapturedKey::new("k").meta();
    assert_eq!(meta_only.to_canonical_string(), "meta+k");
}

#[test]
fn captured_key_names_are_canonicalized() {
    assert_eq!(CapturedKey::new("ArrowUp").shift().to_canonical_string(), "shift+up");
    assert_eq!(CapturedKey::new(" ").to_canonical_string(), "space");
    assert_eq!(CapturedKey::new("Escape").alt().to_canonical_string(), "alt+esc");
}

#[test]
fn bare_modifier_press_is_empty() {
    assert!(CapturedKey::new("Control").ctrl().to_combo().is_empty());
    assert!(CapturedKey::new("Meta").meta().to_combo().is_empty());
    assert!(CapturedKey::new("Shift").shift().to_combo().is_empty());
}

#[test]
fn display_macos_uses_symbols() {
    let combo = parse_key_combo("meta+shift+k");
    assert_eq!(combo.display_for_platform(Platform::MacOS), "⇧⌘K");
}

#[test]
fn display_linux_uses_words() {
    let combo = parse_key_combo("ctrl+alt+up");
    assert_eq!(combo.display_for_platform(Platform::Linux), "Ctrl+Alt+Up");
    let meta = parse_key_combo("meta+j");
    assert_eq!(meta.display_for_platform(Platform::Windows), "Win+J");
}
