//! Application modes and the gesture → action mapping for each.
//!
//! The machine starts in the main menu, moves into one of the games on
//! selection, returns to the menu on a confirmed toggle hold, and ends in
//! `Closed` on a confirmed quit hold.  It emits abstract `Action`s; key
//! side effects are applied by the session.

use tracing::{debug, info};

use crate::cooldown::ActionCooldown;
use crate::gesture::GestureKind;

// ── States ─────────────────────────────────────────────────

/// Top-level application mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    MainMenu,
    DinoGame,
    MazeGame,
    PoseControlledGame,
    /// Terminal.
    Closed,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainMenu => "main-menu",
            Self::DinoGame => "dino-game",
            Self::MazeGame => "maze-game",
            Self::PoseControlledGame => "pose-game",
            Self::Closed => "closed",
        }
    }

    /// Instantaneous hand gestures consumed in this state, highest
    /// priority first.  At most one is accepted per frame.
    pub fn accepted_gestures(&self) -> &'static [GestureKind] {
        match self {
            // A finger pointing down also reads as a fist.
            Self::MainMenu => &[
                GestureKind::PointUp,
                GestureKind::PointDown,
                GestureKind::OpenHand,
                GestureKind::Fist,
            ],
            Self::DinoGame => &[GestureKind::Fist, GestureKind::OpenHand],
            Self::MazeGame => &[
                GestureKind::PointUp,
                GestureKind::OpenHand,
                GestureKind::PinkyUp,
                GestureKind::ThumbRight,
            ],
            Self::PoseControlledGame | Self::Closed => &[],
        }
    }

    /// Timed gestures tracked by hold confirmers in this state.
    pub fn hold_gestures(&self) -> &'static [GestureKind] {
        match self {
            Self::MainMenu | Self::DinoGame | Self::MazeGame => {
                &[GestureKind::RockSign, GestureKind::PeaceSign]
            }
            Self::PoseControlledGame => &[GestureKind::RockSign, GestureKind::PalmsTouching],
            Self::Closed => &[],
        }
    }
}

// ── Actions ────────────────────────────────────────────────

/// Abstract actions emitted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NavigatePrev,
    NavigateNext,
    Select,
    Jump,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PressLeft,
    PressRight,
    ReleaseLeft,
    ReleaseRight,
    Attack,
    Quit,
    EnterMenu,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NavigatePrev => "navigate-prev",
            Self::NavigateNext => "navigate-next",
            Self::Select => "select",
            Self::Jump => "jump",
            Self::MoveUp => "move-up",
            Self::MoveDown => "move-down",
            Self::MoveLeft => "move-left",
            Self::MoveRight => "move-right",
            Self::PressLeft => "press-left",
            Self::PressRight => "press-right",
            Self::ReleaseLeft => "release-left",
            Self::ReleaseRight => "release-right",
            Self::Attack => "attack",
            Self::Quit => "quit",
            Self::EnterMenu => "enter-menu",
        }
    }
}

// ── Events ─────────────────────────────────────────────────

/// Body pose gestures observed in one pose frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoseSnapshot {
    pub lean_left: bool,
    pub lean_right: bool,
    pub arm_raised: bool,
    pub hands_near_knees: bool,
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// An instantaneous gesture passed the cooldown gate.
    Detected(GestureKind),
    /// A timed gesture was held for its full duration.
    HoldConfirmed(GestureKind),
    /// Level-triggered pose readings for the current frame.
    Pose(PoseSnapshot),
}

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Menu entries, in display order.
    pub games: Vec<AppState>,
    /// Minimum seconds between dino jumps.
    pub jump_cooldown_s: f64,
    /// Minimum seconds between repeated moves in one maze direction.
    pub move_cooldown_s: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            games: vec![
                AppState::DinoGame,
                AppState::MazeGame,
                AppState::PoseControlledGame,
            ],
            jump_cooldown_s: 0.3,
            move_cooldown_s: 0.3,
        }
    }
}

impl MachineConfig {
    pub fn config_sexp(&self) -> String {
        let games: Vec<String> = self.games.iter().map(|g| format!(":{}", g.as_str())).collect();
        format!(
            "(:games ({}) :jump-cooldown-s {:.2} :move-cooldown-s {:.2})",
            games.join(" "),
            self.jump_cooldown_s,
            self.move_cooldown_s,
        )
    }
}

// ── Machine ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lean {
    Left,
    Right,
}

impl Lean {
    fn press(self) -> Action {
        match self {
            Self::Left => Action::PressLeft,
            Self::Right => Action::PressRight,
        }
    }

    fn release(self) -> Action {
        match self {
            Self::Left => Action::ReleaseLeft,
            Self::Right => Action::ReleaseRight,
        }
    }
}

const MOVES: [Action; 4] = [
    Action::MoveUp,
    Action::MoveDown,
    Action::MoveLeft,
    Action::MoveRight,
];

pub struct ActionStateMachine {
    pub config: MachineConfig,
    state: AppState,
    selected: usize,
    jump_cooldown: ActionCooldown,
    /// One per entry of `MOVES`.
    move_cooldowns: [ActionCooldown; 4],
    lean: Option<Lean>,
    arm_was_raised: bool,
    hands_were_near_knees: bool,
}

impl Default for ActionStateMachine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl ActionStateMachine {
    pub fn new(config: MachineConfig) -> Self {
        let move_cd = ActionCooldown::new(config.move_cooldown_s);
        Self {
            jump_cooldown: ActionCooldown::new(config.jump_cooldown_s),
            move_cooldowns: [
                move_cd.clone(),
                move_cd.clone(),
                move_cd.clone(),
                move_cd,
            ],
            config,
            state: AppState::MainMenu,
            selected: 0,
            lean: None,
            arm_was_raised: false,
            hands_were_near_knees: false,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Game the menu cursor is on.
    pub fn selected_game(&self) -> Option<AppState> {
        self.config.games.get(self.selected).copied()
    }

    /// Feed one event.  Returns the actions it caused, in order.
    pub fn handle(&mut self, event: GestureEvent, now_s: f64) -> Vec<Action> {
        if self.state == AppState::Closed {
            return Vec::new();
        }
        if event == GestureEvent::HoldConfirmed(GestureKind::RockSign) {
            let mut actions = self.release_movement();
            actions.push(Action::Quit);
            self.transition(AppState::Closed);
            return actions;
        }
        match self.state {
            AppState::MainMenu => self.handle_menu(event),
            AppState::DinoGame => self.handle_dino(event, now_s),
            AppState::MazeGame => self.handle_maze(event, now_s),
            AppState::PoseControlledGame => self.handle_pose(event),
            AppState::Closed => Vec::new(),
        }
    }

    fn handle_menu(&mut self, event: GestureEvent) -> Vec<Action> {
        let count = self.config.games.len();
        match event {
            GestureEvent::Detected(GestureKind::PointUp) if count > 0 => {
                self.selected = (self.selected + count - 1) % count;
                debug!("Menu cursor: {}", self.selected);
                vec![Action::NavigatePrev]
            }
            GestureEvent::Detected(GestureKind::PointDown) if count > 0 => {
                self.selected = (self.selected + 1) % count;
                debug!("Menu cursor: {}", self.selected);
                vec![Action::NavigateNext]
            }
            GestureEvent::Detected(GestureKind::OpenHand)
            | GestureEvent::HoldConfirmed(GestureKind::PeaceSign) => match self.selected_game() {
                Some(game) => {
                    self.transition(game);
                    vec![Action::Select]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn handle_dino(&mut self, event: GestureEvent, now_s: f64) -> Vec<Action> {
        match event {
            GestureEvent::Detected(GestureKind::OpenHand) => {
                if self.jump_cooldown.try_fire(now_s) {
                    vec![Action::Jump]
                } else {
                    Vec::new()
                }
            }
            GestureEvent::HoldConfirmed(GestureKind::PeaceSign) => self.enter_menu(),
            _ => Vec::new(),
        }
    }

    fn handle_maze(&mut self, event: GestureEvent, now_s: f64) -> Vec<Action> {
        let action = match event {
            GestureEvent::Detected(GestureKind::PointUp) => Action::MoveUp,
            GestureEvent::Detected(GestureKind::OpenHand) => Action::MoveDown,
            GestureEvent::Detected(GestureKind::PinkyUp) => Action::MoveLeft,
            GestureEvent::Detected(GestureKind::ThumbRight) => Action::MoveRight,
            GestureEvent::HoldConfirmed(GestureKind::PeaceSign) => return self.enter_menu(),
            _ => return Vec::new(),
        };
        let slot = MOVES.iter().position(|m| *m == action).unwrap_or(0);
        if self.move_cooldowns[slot].try_fire(now_s) {
            vec![action]
        } else {
            Vec::new()
        }
    }

    fn handle_pose(&mut self, event: GestureEvent) -> Vec<Action> {
        match event {
            GestureEvent::Pose(pose) => {
                let mut actions = Vec::new();
                let wanted = match (pose.lean_left, pose.lean_right) {
                    (true, false) => Some(Lean::Left),
                    (false, true) => Some(Lean::Right),
                    _ => None,
                };
                if wanted != self.lean {
                    if let Some(current) = self.lean {
                        actions.push(current.release());
                    }
                    if let Some(next) = wanted {
                        actions.push(next.press());
                    }
                    self.lean = wanted;
                }
                if pose.arm_raised && !self.arm_was_raised {
                    actions.push(Action::Attack);
                }
                if pose.hands_near_knees && !self.hands_were_near_knees {
                    actions.push(Action::Jump);
                }
                self.arm_was_raised = pose.arm_raised;
                self.hands_were_near_knees = pose.hands_near_knees;
                actions
            }
            GestureEvent::HoldConfirmed(GestureKind::PalmsTouching) => self.enter_menu(),
            _ => Vec::new(),
        }
    }

    fn enter_menu(&mut self) -> Vec<Action> {
        let mut actions = self.release_movement();
        actions.push(Action::EnterMenu);
        self.transition(AppState::MainMenu);
        actions
    }

    /// Release actions for a held lean, if any.
    fn release_movement(&mut self) -> Vec<Action> {
        self.lean.take().map(|l| vec![l.release()]).unwrap_or_default()
    }

    fn transition(&mut self, to: AppState) {
        if to == self.state {
            return;
        }
        info!("State: {} -> {}", self.state.as_str(), to.as_str());
        self.state = to;
        self.lean = None;
        self.arm_was_raised = false;
        self.hands_were_near_knees = false;
        self.jump_cooldown.reset();
        for cd in &mut self.move_cooldowns {
            cd.reset();
        }
    }

    /// Meaning of `kind` in the current state, for the announcement.
    pub fn context_action(&self, kind: GestureKind) -> &'static str {
        use GestureKind::*;
        match (self.state, kind) {
            (_, RockSign) => "cerrar programa",
            (AppState::MainMenu, PeaceSign) => "ir al juego",
            (_, PeaceSign) | (_, PalmsTouching) => "volver al menú",
            (_, Fist) => "detectado",
            (AppState::MainMenu, OpenHand) => "seleccionar",
            (AppState::MainMenu, PointUp) => "opción anterior",
            (AppState::MainMenu, PointDown) => "siguiente opción",
            (AppState::DinoGame, OpenHand) => "saltar",
            (AppState::MazeGame, PointUp) => "arriba",
            (AppState::MazeGame, OpenHand) => "abajo",
            (AppState::MazeGame, PinkyUp) | (_, LeanLeft) => "izquierda",
            (AppState::MazeGame, ThumbRight) | (_, LeanRight) => "derecha",
            (_, ArmRaised) => "atacar",
            (_, HandsNearKnees) => "saltar",
            _ => "detectado",
        }
    }

    pub fn status_sexp(&self) -> String {
        let selected = self
            .selected_game()
            .map(|g| format!(":{}", g.as_str()))
            .unwrap_or_else(|| "nil".to_string());
        let lean = match self.lean {
            Some(Lean::Left) => ":left",
            Some(Lean::Right) => ":right",
            None => "nil",
        };
        format!(
            "(:state :{} :selected-index {} :selected {} :lean {})",
            self.state.as_str(),
            self.selected,
            selected,
            lean,
        )
    }
}
