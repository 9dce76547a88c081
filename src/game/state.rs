use super::action::Direction;
use super::problems::{Answer, Problem};

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current direction of movement
    pub direction: Direction,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut body = vec![head];

        // Add initial body segments behind the head
        let (dx, dy) = direction.delta();
        for i in 1..length.max(1) {
            let prev = body[i - 1];
            body.push(prev.moved_by(-dx, -dy));
        }

        Self { body, direction }
    }

    /// Build a snake from explicit segments, head first
    pub fn from_segments(body: Vec<Position>, direction: Direction) -> Self {
        Self { body, direction }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Check if position is covered by any segment, head and tail included
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Add a new head without touching the tail
    pub fn push_head(&mut self, head: Position) {
        self.body.insert(0, head);
    }

    /// Drop the last segment
    pub fn pop_tail(&mut self) -> Option<Position> {
        if self.body.len() > 1 {
            self.body.pop()
        } else {
            None
        }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }
}

/// Palette food items are drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodColor {
    Yellow,
    Neon,
    Orange,
    Cyan,
}

impl FoodColor {
    pub const ALL: [FoodColor; 4] = [
        FoodColor::Yellow,
        FoodColor::Neon,
        FoodColor::Orange,
        FoodColor::Cyan,
    ];

    /// RGB value of the color
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            FoodColor::Yellow => (0xFF, 0xEB, 0x3B),
            FoodColor::Neon => (0x39, 0xFF, 0x14),
            FoodColor::Orange => (0xFF, 0x57, 0x33),
            FoodColor::Cyan => (0x00, 0xFF, 0xFF),
        }
    }
}

/// A numbered answer lying on the board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodItem {
    pub position: Position,
    pub value: Answer,
    pub is_correct: bool,
    pub color: FoodColor,
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No run has started yet
    Idle,
    Running,
    Paused,
    /// The last run ended; waiting for a restart
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    /// Snake left the board
    Wall,
    /// Snake ran into itself
    SelfCollision,
    /// Snake ate a wrong answer
    WrongAnswer,
}

impl GameOverCause {
    pub fn describe(&self) -> &'static str {
        match self {
            GameOverCause::Wall => "hit the wall",
            GameOverCause::SelfCollision => "bit its own tail",
            GameOverCause::WrongAnswer => "ate a wrong answer",
        }
    }
}

/// What the player is shown when a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverReport {
    pub score: u32,
    pub high_score: u32,
    pub new_high_score: bool,
    pub cause: GameOverCause,
}

/// State of the current run
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Vec<FoodItem>,
    pub problem: Option<Problem>,
    pub score: u32,
    pub steps: u32,
    pub phase: Phase,
    /// Latest direction request, applied on the next tick
    pub pending_direction: Option<Direction>,
    /// Set when a run ends, cleared on restart
    pub game_over: Option<GameOverReport>,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake) -> Self {
        Self {
            snake,
            food: Vec::new(),
            problem: None,
            score: 0,
            steps: 0,
            phase: Phase::Idle,
            pending_direction: None,
            game_over: None,
        }
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }

    /// Index of the food item lying at a position
    pub fn food_at(&self, pos: Position) -> Option<usize> {
        self.food.iter().position(|f| f.position == pos)
    }
}
