/// True when any player has a pending intent.
fn has_player_acted(components: &ComponentStores, intents: &IntentStore) -> bool {
    components
        .players
        .iter()
        .any(|player_id| !intents.get(*player_id).is_none())
}

/// Steps every player's action budget once. Reports whether any of them
/// wrapped, which means the round is complete and the world may move.
fn advance_action_budget(components: &mut ComponentStores) -> bool {
    let mut wrapped = false;
    for player_id in &components.players {
        let Some(budget) = components.action_budgets.get_mut(player_id) else {
            continue;
        };
        let budget_wrapped = budget.advance();
        wrapped |= budget_wrapped;
    }
    wrapped
}

/// Budgets only advance on frames where a player acted.
fn should_resolve_turn(components: &mut ComponentStores, intents: &IntentStore) -> bool {
    has_player_acted(components, intents) && advance_action_budget(components)
}
