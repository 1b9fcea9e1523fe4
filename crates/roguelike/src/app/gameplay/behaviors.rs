/// Builds the machine a preset names. `BehaviorPreset::None` carries no
/// machine at all.
fn build_behavior(preset: BehaviorPreset) -> Result<Option<StateMachine>, MachineError> {
    let machine = match preset {
        BehaviorPreset::None => return Ok(None),
        BehaviorPreset::Idle => StateMachine::single(Idle),
        BehaviorPreset::PatrolAttackFlee => patrol_attack_flee()?,
        BehaviorPreset::PatrolFlee => patrol_flee()?,
        BehaviorPreset::Attack => StateMachine::single(MoveTowardNearestEnemy),
        BehaviorPreset::Guardian => guardian()?,
        BehaviorPreset::Archer => archer()?,
        BehaviorPreset::Healer => StateMachine::single(FollowAndHealPlayer),
    };
    Ok(Some(machine))
}

fn patrol_attack_flee() -> Result<StateMachine, MachineError> {
    let mut machine = StateMachine::new();
    let patrol = machine.add_state(Patrol::new(PATROL_RADIUS));
    let chase = machine.add_state(MoveTowardNearestEnemy);
    let flee = machine.add_state(FleeFromNearestEnemy);

    machine.add_transition(Predicate::enemy_within_range(ENGAGE_RANGE), patrol, chase)?;
    machine.add_transition(
        !Predicate::enemy_within_range(CHASE_GIVE_UP_RANGE),
        chase,
        patrol,
    )?;
    machine.add_transition(
        Predicate::hitpoints_below(FLEE_HITPOINTS)
            .and(Predicate::enemy_within_range(CHASE_GIVE_UP_RANGE)),
        chase,
        flee,
    )?;
    machine.add_transition(
        Predicate::hitpoints_below(FLEE_HITPOINTS).and(Predicate::enemy_within_range(ENGAGE_RANGE)),
        patrol,
        flee,
    )?;
    machine.add_transition(!Predicate::enemy_within_range(FLEE_SAFE_RANGE), flee, patrol)?;
    Ok(machine)
}

fn patrol_flee() -> Result<StateMachine, MachineError> {
    let mut machine = StateMachine::new();
    let patrol = machine.add_state(Patrol::new(PATROL_RADIUS));
    let flee = machine.add_state(FleeFromNearestEnemy);

    machine.add_transition(Predicate::enemy_within_range(ENGAGE_RANGE), patrol, flee)?;
    machine.add_transition(
        !Predicate::enemy_within_range(CHASE_GIVE_UP_RANGE),
        flee,
        patrol,
    )?;
    Ok(machine)
}

/// Patrols until an enemy comes close, then fights inside a combat
/// container: approach, and strike once adjacent. Leaves combat to flee when
/// badly hurt or to patrol when the enemy drifts out of the leash.
fn guardian() -> Result<StateMachine, MachineError> {
    let mut machine = StateMachine::new();
    let patrol = machine.add_state(Patrol::new(PATROL_RADIUS));
    let combat = machine.add_state(Idle);
    let approach = machine.add_child_state(MoveTowardNearestEnemy, combat)?;
    let strike = machine.add_child_state(AttackEnemy, combat)?;
    let flee = machine.add_state(FleeFromNearestEnemy);

    machine.add_transition(Predicate::enemy_within_range(ENGAGE_RANGE), patrol, combat)?;
    machine.add_transition(Predicate::enemy_reachable(), patrol, combat)?;
    machine.add_transition(
        Predicate::enemy_within_range(GUARDIAN_STRIKE_RANGE),
        approach,
        strike,
    )?;
    machine.add_transition(
        !Predicate::enemy_within_range(GUARDIAN_STRIKE_RANGE),
        strike,
        approach,
    )?;
    machine.add_transition(
        Predicate::hitpoints_below(GUARDIAN_FLEE_HITPOINTS),
        combat,
        flee,
    )?;
    machine.add_transition(
        !Predicate::enemy_within_range(GUARDIAN_LEASH_RANGE),
        combat,
        patrol,
    )?;
    machine.add_transition(!Predicate::enemy_within_range(FLEE_SAFE_RANGE), flee, patrol)?;
    Ok(machine)
}

fn archer() -> Result<StateMachine, MachineError> {
    let mut machine = StateMachine::new();
    let patrol = machine.add_state(Patrol::new(ARCHER_PATROL_RADIUS));
    let shoot = machine.add_state(ArrowAttack::new(ARCHER_MIN_RANGE, ARCHER_MAX_RANGE));

    machine.add_transition(
        Predicate::enemy_within_range(ARCHER_ENGAGE_RANGE),
        patrol,
        shoot,
    )?;
    machine.add_transition(
        !Predicate::enemy_within_range(ARCHER_DISENGAGE_RANGE),
        shoot,
        patrol,
    )?;
    Ok(machine)
}
