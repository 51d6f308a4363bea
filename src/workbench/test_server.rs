//! In-process stand-in for the marks API used by workbench tests.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::schemas::user::UserRole;
use crate::schemas::auth::{LoginRequest, RefreshRequest, TokenResponse};
use crate::schemas::catalog::{Exam, Student, Subject};
use crate::schemas::marks::{
    BatchResult, GpaBatch, MarksBatch, StudentWithGpa, StudentWithMarks, SubjectMark,
};
use crate::schemas::user::UserResponse;
use crate::schemas::{DataResponse, ErrorResponse};

pub(crate) fn access_token(generation: usize) -> String {
    format!("access-{generation}")
}

fn refresh_token(generation: usize) -> String {
    format!("refresh-{generation}")
}

struct StubState {
    generation: AtomicUsize,
    refresh_count: AtomicUsize,
    fail_marks: AtomicBool,
    last_exam: Mutex<Option<String>>,
    submissions: Mutex<Vec<Value>>,
    students: Vec<Student>,
    subjects: Vec<Subject>,
    exams: Vec<Exam>,
    marks: Mutex<BTreeMap<(String, String), SubjectMark>>,
    gpa: Mutex<HashMap<String, (Option<f64>, Option<f64>)>>,
}

pub(crate) struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(seed());
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/sub/getSubjects", get(subjects))
            .route("/exams/getExams", get(exams))
            .route("/students/getStudentsByClass/:year/:level", get(students_by_class))
            .route("/marks/getClassMarks/:level/:year/:exam", get(class_marks))
            .route("/marks/getGPA/:year", get(gpa))
            .route("/marks/addMarks", post(add_marks))
            .route("/marks/addGPA", post(add_gpa));
        let app = Router::new().nest("/api", api).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self { addr, state }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.state.refresh_count.load(Ordering::SeqCst)
    }

    pub(crate) fn last_exam_path(&self) -> Option<String> {
        self.state.last_exam.lock().unwrap().clone()
    }

    pub(crate) fn submissions(&self) -> Vec<Value> {
        self.state.submissions.lock().unwrap().clone()
    }

    pub(crate) fn fail_marks(&self, fail: bool) {
        self.state.fail_marks.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn stored_mark(&self, student_id: &str, subject_id: &str) -> Option<SubjectMark> {
        self.state
            .marks
            .lock()
            .unwrap()
            .get(&(student_id.to_string(), subject_id.to_string()))
            .cloned()
    }
}

fn student(id: &str, roll: i32, level: i32, section: &str, department: Option<&str>) -> Student {
    Student {
        id: id.to_string(),
        name: format!("Student {id}"),
        roll,
        level,
        section: section.to_string(),
        department: department.map(str::to_string),
        year: 2025,
    }
}

fn subject(
    id: &str,
    level: i32,
    department: Option<&str>,
    components: (Option<i32>, Option<i32>, Option<i32>),
) -> Subject {
    Subject {
        id: id.to_string(),
        name: id.to_string(),
        level,
        department: department.map(str::to_string),
        cq_mark: components.0,
        mcq_mark: components.1,
        practical_mark: components.2,
        full_mark: 100,
    }
}

fn seed() -> StubState {
    let exam = |name: &str, levels: Vec<i32>| Exam {
        id: name.to_lowercase(),
        name: name.to_string(),
        year: 2025,
        levels,
    };

    let mut marks = BTreeMap::new();
    marks.insert(
        ("s1".to_string(), "physics-9".to_string()),
        SubjectMark { subject_id: "physics-9".to_string(), cq: 30, mcq: 20, practical: 20 },
    );
    let mut gpa = HashMap::new();
    gpa.insert("j1".to_string(), (Some(4.5), None));

    StubState {
        generation: AtomicUsize::new(0),
        refresh_count: AtomicUsize::new(0),
        fail_marks: AtomicBool::new(false),
        last_exam: Mutex::new(None),
        submissions: Mutex::new(Vec::new()),
        students: vec![
            student("j1", 2, 8, "A", None),
            student("j2", 1, 8, "A", None),
            student("j3", 1, 8, "B", None),
            student("s1", 1, 9, "A", Some("Science")),
            student("s2", 2, 9, "A", Some("Arts")),
            student("s3", 3, 9, "A", Some("Science")),
            student("t1", 1, 10, "A", Some("Science")),
        ],
        subjects: vec![
            subject("bangla-8", 8, None, (Some(70), Some(30), None)),
            subject("bangla-9", 9, None, (Some(70), Some(30), None)),
            subject("physics-9", 9, Some("Science"), (Some(40), Some(25), Some(25))),
            subject("history-9", 9, Some("Arts"), (Some(70), Some(30), None)),
            subject("drawing-9", 9, None, (None, None, None)),
        ],
        exams: vec![exam("Half Yearly", vec![9]), exam("JSC", vec![8]), exam("SSC", vec![10])],
        marks: Mutex::new(marks),
        gpa: Mutex::new(gpa),
    }
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail: detail.to_string() }))
        .into_response()
}

fn authorize(state: &StubState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", access_token(state.generation.load(Ordering::SeqCst)));
    let presented = headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok());
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "Invalid authentication credentials"))
    }
}

fn tokens(generation: usize) -> TokenResponse {
    TokenResponse {
        access_token: access_token(generation),
        refresh_token: refresh_token(generation),
        token_type: "bearer".to_string(),
        user: UserResponse {
            id: "u1".to_string(),
            username: "teacher".to_string(),
            full_name: "Class Teacher".to_string(),
            role: UserRole::Teacher,
            is_active: true,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        },
    }
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<LoginRequest>) -> Response {
    if body.username != "teacher" || body.password != "secret" {
        return error(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    Json(tokens(state.generation.load(Ordering::SeqCst))).into_response()
}

async fn refresh(State(state): State<Arc<StubState>>, Json(body): Json<RefreshRequest>) -> Response {
    // Widens the window in which concurrent callers would race.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let generation = state.generation.load(Ordering::SeqCst);
    if body.refresh_token != refresh_token(generation) {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }
    state.refresh_count.fetch_add(1, Ordering::SeqCst);
    let next = generation + 1;
    state.generation.store(next, Ordering::SeqCst);
    Json(tokens(next)).into_response()
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn subjects(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    Json(DataResponse::new(state.subjects.clone())).into_response()
}

async fn exams(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    Json(DataResponse::new(state.exams.clone())).into_response()
}

async fn students_by_class(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((year, level)): Path<(i32, i32)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let rows: Vec<Student> = state
        .students
        .iter()
        .filter(|student| student.year == year && student.level == level)
        .cloned()
        .collect();
    Json(DataResponse::new(rows)).into_response()
}

async fn class_marks(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((level, year, exam)): Path<(i32, i32, String)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    *state.last_exam.lock().unwrap() = Some(exam);
    if state.fail_marks.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list marks");
    }

    let marks = state.marks.lock().unwrap();
    let rows: Vec<StudentWithMarks> = state
        .students
        .iter()
        .filter(|student| student.year == year && student.level == level)
        .map(|student| StudentWithMarks {
            id: student.id.clone(),
            name: student.name.clone(),
            roll: student.roll,
            section: student.section.clone(),
            department: student.department.clone(),
            marks: marks
                .iter()
                .filter(|((student_id, _), _)| *student_id == student.id)
                .map(|(_, mark)| mark.clone())
                .collect(),
        })
        .collect();
    Json(DataResponse::new(rows)).into_response()
}

async fn gpa(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(year): Path<i32>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let stored = state.gpa.lock().unwrap();
    let rows: Vec<StudentWithGpa> = state
        .students
        .iter()
        .filter(|student| student.year == year)
        .map(|student| {
            let (jsc_gpa, ssc_gpa) = stored.get(&student.id).copied().unwrap_or((None, None));
            StudentWithGpa {
                id: student.id.clone(),
                name: student.name.clone(),
                roll: student.roll,
                level: student.level,
                section: student.section.clone(),
                department: student.department.clone(),
                jsc_gpa,
                ssc_gpa,
            }
        })
        .collect();
    Json(DataResponse::new(rows)).into_response()
}

async fn add_marks(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.submissions.lock().unwrap().push(body.clone());
    let Ok(batch) = serde_json::from_value::<MarksBatch>(body) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "malformed batch");
    };
    if batch.students.is_empty() {
        return error(StatusCode::BAD_REQUEST, "batch contains no students");
    }

    let mut marks = state.marks.lock().unwrap();
    let mut updated = 0;
    for row in batch.students {
        for mark in row.subject_marks {
            marks.insert((row.student_id.clone(), mark.subject_id.clone()), mark);
            updated += 1;
        }
    }
    Json(BatchResult { message: "Marks saved successfully".to_string(), updated }).into_response()
}

async fn add_gpa(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.submissions.lock().unwrap().push(body.clone());
    let Ok(batch) = serde_json::from_value::<GpaBatch>(body) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "malformed batch");
    };
    if batch.students.is_empty() {
        return error(StatusCode::BAD_REQUEST, "batch contains no students");
    }
    if let Some(row) = batch.students.iter().find(|row| row.gpa.is_some_and(|gpa| gpa < 0.0)) {
        let detail = format!(
            "GPA {} for student {} must be between 0 and 5",
            row.gpa.unwrap_or_default(),
            row.student_id
        );
        return error(StatusCode::BAD_REQUEST, &detail);
    }

    let mut stored = state.gpa.lock().unwrap();
    for row in &batch.students {
        let entry = stored.entry(row.student_id.clone()).or_insert((None, None));
        if batch.exam_name == "SSC" {
            entry.1 = row.gpa;
        } else {
            entry.0 = row.gpa;
        }
    }
    let updated = batch.students.len();
    Json(BatchResult { message: "GPA saved successfully".to_string(), updated }).into_response()
}
