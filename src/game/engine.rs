use super::{
    action::Direction,
    board::Board,
    config::GameConfig,
    problems::{Answer, Problem, ProblemBank},
    state::{FoodColor, FoodItem, GameOverCause, GameState, Phase, Position, Snake},
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Number of food items on the board during a run
pub const FOOD_PER_PROBLEM: usize = 3;

/// Largest distance between a synthesized decoy and the correct answer
const MAX_DECOY_OFFSET: i32 = 3;
/// Random decoy draws before falling back to scaled decoys
const MAX_DECOY_ATTEMPTS: usize = 32;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The run is not in the `Running` phase; nothing changed
    Skipped,
    /// The head entered an empty cell and the tail followed
    Moved,
    /// The head ate the correct answer; the snake grew and a new problem is up
    Answered,
    /// The run ended
    GameOver(GameOverCause),
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    bank: ProblemBank,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig, bank: ProblemBank) -> Self {
        Self {
            config,
            bank,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an engine whose random choices are reproducible
    pub fn with_seed(config: GameConfig, bank: ProblemBank, seed: u64) -> Self {
        Self {
            config,
            bank,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    /// Characters needed to print any value that can end up on the board
    pub fn widest_food_label(&self) -> usize {
        self.bank
            .answers()
            .flat_map(|answer| {
                [
                    answer,
                    answer.offset(MAX_DECOY_OFFSET),
                    answer.offset(-MAX_DECOY_OFFSET),
                ]
            })
            .map(|answer| answer.to_string().chars().count())
            .max()
            .unwrap_or(1)
    }

    /// Fresh state: one snake at the board center heading right, score zero
    pub fn reset(&mut self, board: &Board) -> GameState {
        let snake = Snake::new(
            board.center(),
            Direction::Right,
            self.config.initial_snake_length,
        );

        GameState::new(snake)
    }

    /// Draw the next problem using the configured filters
    pub fn pick_problem(&mut self) -> Problem {
        let problem = self.bank.pick(
            &self.config.problem_type,
            &self.config.difficulty,
            &mut self.rng,
        );
        debug!(question = %problem.question, answer = %problem.correct_answer, "Picked problem");
        problem
    }

    /// The three values shown for a problem, in random order.
    ///
    /// Uses the leading choices and pads with decoys near the correct answer.
    /// The correct answer is always among the result.
    pub fn food_values(&mut self, problem: &Problem) -> Vec<Answer> {
        let correct = problem.correct_answer;

        let mut values: Vec<Answer> = Vec::with_capacity(FOOD_PER_PROBLEM);
        for choice in &problem.choices {
            if values.len() == FOOD_PER_PROBLEM {
                break;
            }
            if !values.contains(choice) {
                values.push(*choice);
            }
        }

        if !values.contains(&correct) {
            if values.len() == FOOD_PER_PROBLEM {
                values[FOOD_PER_PROBLEM - 1] = correct;
            } else {
                values.push(correct);
            }
        }

        let mut attempts = 0;
        while values.len() < FOOD_PER_PROBLEM && attempts < MAX_DECOY_ATTEMPTS {
            attempts += 1;
            let offset = self.rng.gen_range(1..=MAX_DECOY_OFFSET);
            let offset = if self.rng.gen_bool(0.5) { offset } else { -offset };
            let decoy = correct.offset(offset);
            if !values.contains(&decoy) {
                values.push(decoy);
            }
        }

        // Small offsets vanish in rounding for huge answers
        let scaled = [Answer(-correct.0), Answer(correct.0 * 2.0), Answer(correct.0 / 2.0)];
        for decoy in scaled {
            if values.len() == FOOD_PER_PROBLEM {
                break;
            }
            if decoy.0.is_finite() && !values.contains(&decoy) {
                values.push(decoy);
            }
        }

        values.shuffle(&mut self.rng);
        values
    }

    /// Place the values of a problem on free cells of the board.
    ///
    /// Cells under the snake or another food item are never used. If the
    /// board runs out of free cells the remaining values are left off, the
    /// correct answer being placed first.
    pub fn spawn_food(&mut self, problem: &Problem, snake: &Snake, board: &Board) -> Vec<FoodItem> {
        let mut values = self.food_values(problem);
        // Stable sort: correct answer first, the rest keep their shuffled order
        values.sort_by_key(|v| *v != problem.correct_answer);

        let mut free: Vec<Position> = board.cells().filter(|p| !snake.occupies(*p)).collect();
        let mut food = Vec::with_capacity(values.len());

        for value in values {
            if free.is_empty() {
                debug!(placed = food.len(), "Board too full to place every food item");
                break;
            }
            let index = self.rng.gen_range(0..free.len());
            let position = free.swap_remove(index);
            let color = FoodColor::ALL[self.rng.gen_range(0..FoodColor::ALL.len())];

            food.push(FoodItem {
                position,
                value,
                is_correct: value == problem.correct_answer,
                color,
            });
        }

        // Keep the on-board order independent of which item is correct
        food.shuffle(&mut self.rng);
        food
    }

    /// Pick a problem and lay out its food in the state
    pub fn serve_problem(&mut self, state: &mut GameState, board: &Board) {
        let problem = self.pick_problem();
        state.food = self.spawn_food(&problem, &state.snake, board);
        state.problem = Some(problem);
    }

    /// Execute one tick of the game
    pub fn step(&mut self, state: &mut GameState, board: &Board) -> StepOutcome {
        if state.phase != Phase::Running {
            return StepOutcome::Skipped;
        }

        // Only the latest request counts, and never a 180° turn
        if let Some(requested) = state.pending_direction.take() {
            if !state.snake.direction.is_opposite(requested) {
                state.snake.direction = requested;
            }
        }

        let new_head = state.snake.head().moved_in_direction(state.snake.direction);
        state.steps += 1;

        if let Some(cause) = self.check_collision(state, board, new_head) {
            state.phase = Phase::GameOver;
            return StepOutcome::GameOver(cause);
        }

        state.snake.push_head(new_head);

        match state.food_at(new_head) {
            Some(index) => {
                let eaten = state.food.remove(index);
                if eaten.is_correct {
                    state.score += 1;
                    self.serve_problem(state, board);
                    StepOutcome::Answered
                } else {
                    state.phase = Phase::GameOver;
                    StepOutcome::GameOver(GameOverCause::WrongAnswer)
                }
            }
            None => {
                state.snake.pop_tail();
                StepOutcome::Moved
            }
        }
    }

    /// Check if the new head position causes a collision
    fn check_collision(
        &self,
        state: &GameState,
        board: &Board,
        pos: Position,
    ) -> Option<GameOverCause> {
        if !board.contains(pos) {
            return Some(GameOverCause::Wall);
        }

        // The tail has not moved yet, so it still counts
        if state.snake.occupies(pos) {
            return Some(GameOverCause::SelfCollision);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const BANK: &str = r#"{
        "levels": [
            { "type": "multiplication", "difficulties": [
                { "difficulty": "easy", "problems": [
                    { "question": "3 * 4", "correctAnswer": 12, "choices": [12, 10, 14] }
                ] }
            ] }
        ]
    }"#;

    fn engine() -> GameEngine {
        GameEngine::with_seed(
            GameConfig::default(),
            ProblemBank::from_json(BANK).unwrap(),
            42,
        )
    }

    fn running(snake: Snake) -> GameState {
        let mut state = GameState::new(snake);
        state.phase = Phase::Running;
        state
    }

    fn food(x: i32, y: i32, value: i32, is_correct: bool) -> FoodItem {
        FoodItem {
            position: Position::new(x, y),
            value: Answer::from(value),
            is_correct,
            color: FoodColor::Yellow,
        }
    }

    #[test]
    fn test_reset() {
        let mut engine = engine();
        let state = engine.reset(&Board::new(12, 16, 10));

        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.body, vec![Position::new(6, 8)]);
        assert_eq!(state.snake.direction, Direction::Right);
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 2));

        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(state.snake.body, vec![Position::new(6, 5), Position::new(5, 5)]);
        assert_eq!(state.steps, 1);
    }

    #[test]
    fn test_correct_answer_grows_snake() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 1));
        state.food = vec![food(6, 5, 12, true), food(0, 0, 10, false), food(9, 9, 14, false)];

        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::Answered);
        assert_eq!(state.score, 1);
        assert_eq!(state.snake.len(), 2);
        assert_eq!(state.snake.head(), Position::new(6, 5));
        assert_eq!(state.food.len(), FOOD_PER_PROBLEM);
        assert_eq!(state.food.iter().filter(|f| f.is_correct).count(), 1);
        assert_eq!(state.problem.as_ref().map(|p| p.question.as_str()), Some("3 × 4"));
    }

    #[test]
    fn test_wrong_answer_ends_run() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 2));
        state.food = vec![food(6, 5, 10, false), food(0, 0, 12, true), food(9, 9, 14, false)];

        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::GameOver(GameOverCause::WrongAnswer));
        assert_eq!(state.phase, Phase::GameOver);
        // Head was added and the tail kept
        assert_eq!(state.snake.len(), 3);
        assert_eq!(state.food.len(), 2);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let body = vec![Position::new(0, 2), Position::new(1, 2), Position::new(2, 2)];
        let mut state = running(Snake::from_segments(body, Direction::Left));
        let before = state.snake.clone();

        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::GameOver(GameOverCause::Wall));
        assert_eq!(state.snake, before);
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn test_self_collision() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);

        // Body: (5,5), (4,5), (3,5), (2,5)
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 4));
        let turns = [None, Some(Direction::Down), Some(Direction::Left)];
        for turn in turns {
            state.pending_direction = turn;
            assert_eq!(engine.step(&mut state, &board), StepOutcome::Moved);
        }

        // (5,5) is still part of the body
        state.pending_direction = Some(Direction::Up);
        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::GameOver(GameOverCause::SelfCollision));
    }

    #[test]
    fn test_moving_into_the_tail_is_fatal() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        // A 2x2 loop whose head is next to its tail
        let body = vec![
            Position::new(4, 5),
            Position::new(4, 4),
            Position::new(5, 4),
            Position::new(5, 5),
        ];
        let mut state = running(Snake::from_segments(body, Direction::Down));
        state.pending_direction = Some(Direction::Right);

        let outcome = engine.step(&mut state, &board);

        assert_eq!(outcome, StepOutcome::GameOver(GameOverCause::SelfCollision));
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 3));
        state.pending_direction = Some(Direction::Left);

        assert_eq!(engine.step(&mut state, &board), StepOutcome::Moved);
        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), Position::new(6, 5));
        assert_eq!(state.pending_direction, None);
    }

    #[test]
    fn test_not_running_is_skipped() {
        let mut engine = engine();
        let board = Board::new(10, 10, 10);
        let mut state = running(Snake::new(Position::new(5, 5), Direction::Right, 1));

        for phase in [Phase::Idle, Phase::Paused, Phase::GameOver] {
            state.phase = phase;
            let before = state.clone();
            assert_eq!(engine.step(&mut state, &board), StepOutcome::Skipped);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_food_values_pad_with_decoys() {
        let mut engine = engine();
        let problem = Problem::new("2 + 2", Answer(4.0), Vec::new());

        for _ in 0..50 {
            let values = engine.food_values(&problem);
            assert_eq!(values.len(), FOOD_PER_PROBLEM);
            assert!(values.contains(&Answer(4.0)));
            for v in &values {
                let distance = (v.0 - 4.0).abs();
                assert!(distance <= 3.0);
            }
            assert_ne!(values[0], values[1]);
            assert_ne!(values[0], values[2]);
            assert_ne!(values[1], values[2]);
        }
    }

    #[test]
    fn test_food_values_keep_correct_answer() {
        let mut engine = engine();
        let choices = vec![Answer(1.0), Answer(2.0), Answer(3.0), Answer(9.0)];
        let problem = Problem::new("3 * 3", Answer(9.0), choices);

        let values = engine.food_values(&problem);
        assert_eq!(values.len(), FOOD_PER_PROBLEM);
        assert!(values.contains(&Answer(9.0)));
    }

    #[test]
    fn test_food_values_for_huge_answer() {
        let mut engine = engine();
        let huge = Answer(2f64.powi(60));
        assert_eq!(huge.offset(1), huge);
        let problem = Problem::new("2 ^ 60", huge, Vec::new());

        let values = engine.food_values(&problem);
        assert_eq!(values.len(), FOOD_PER_PROBLEM);
        assert_eq!(values.iter().filter(|v| **v == huge).count(), 1);
    }

    #[test]
    fn test_widest_food_label_counts_decoys() {
        let bank = ProblemBank::from_json(
            r#"{ "levels": [ { "type": "t", "difficulties": [ { "difficulty": "d", "problems": [
                { "question": "99 * 10", "correctAnswer": 990, "choices": [980, 990] },
                { "question": "5 - 7", "correctAnswer": -2 }
            ] } ] } ] }"#,
        )
        .unwrap();
        let engine = GameEngine::with_seed(GameConfig::default(), bank, 1);

        // 990 + 3 needs four characters
        assert_eq!(engine.widest_food_label(), 4);
    }

    #[test]
    fn test_spawn_food_avoids_snake() {
        let mut engine = engine();
        let board = Board::new(4, 4, 10);
        // Snake fills everything but the last row
        let body: Vec<Position> = board.cells().filter(|p| p.y < 3).collect();
        let snake = Snake::from_segments(body, Direction::Right);
        let problem = Problem::new("1 + 1", Answer(2.0), vec![Answer(2.0), Answer(3.0)]);

        for _ in 0..20 {
            let food = engine.spawn_food(&problem, &snake, &board);
            assert_eq!(food.len(), FOOD_PER_PROBLEM);
            assert_eq!(food.iter().filter(|f| f.is_correct).count(), 1);
            for item in &food {
                assert_eq!(item.position.y, 3);
                assert!(board.contains(item.position));
            }
            let cells: HashSet<Position> = food.iter().map(|f| f.position).collect();
            assert_eq!(cells.len(), FOOD_PER_PROBLEM);
        }
    }

    #[test]
    fn test_spawn_food_on_crowded_board() {
        let mut engine = engine();
        let board = Board::new(3, 3, 10);
        let body: Vec<Position> = board.cells().skip(1).collect();
        let snake = Snake::from_segments(body, Direction::Right);
        let problem = Problem::new("1 + 1", Answer(2.0), Vec::new());

        let food = engine.spawn_food(&problem, &snake, &board);

        assert_eq!(food.len(), 1);
        assert!(food[0].is_correct);
        assert_eq!(food[0].position, Position::new(0, 0));
    }
}
