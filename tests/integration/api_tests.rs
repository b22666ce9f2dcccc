//! API integration tests
//!
//! Each test starts an in-process mock of the library REST API and drives
//! the real HTTP client against it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use library_client::{
    api::{Fetch, LibraryApi},
    app::{App, Page},
    config::AppConfig,
    models::{Book, BookInput, BookUpdate, BorrowInput, BorrowSummary},
    AppState,
};

#[derive(Default)]
struct Store {
    books: Vec<Book>,
    summary: HashMap<String, BorrowSummary>,
    next_id: u32,
    hits: HashMap<&'static str, usize>,
}

type Shared = Arc<Mutex<Store>>;
type Reply = (StatusCode, Json<Value>);

fn ok(message: &str, data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "message": message })))
}

fn hit(store: &mut Store, name: &'static str) {
    *store.hits.entry(name).or_default() += 1;
}

async fn list_books(State(store): State<Shared>) -> Reply {
    let mut store = store.lock().unwrap();
    hit(&mut store, "list");
    ok("Books retrieved successfully", json!(store.books))
}

async fn get_book(State(store): State<Shared>, Path(id): Path<String>) -> Reply {
    let mut store = store.lock().unwrap();
    hit(&mut store, "get");
    match store.books.iter().find(|b| b.id == id) {
        Some(book) => ok("Book retrieved successfully", json!(book)),
        None => fail(StatusCode::NOT_FOUND, "Book not found"),
    }
}

async fn create_book(State(store): State<Shared>, Json(input): Json<BookInput>) -> Reply {
    let mut store = store.lock().unwrap();
    store.next_id += 1;
    let book = Book {
        id: format!("bk{}", store.next_id),
        title: input.title,
        author: input.author,
        genre: input.genre,
        isbn: input.isbn,
        description: input.description,
        img_url: input.img_url,
        copies: input.copies,
        available: input.available.unwrap_or(input.copies > 0),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    };
    store.books.push(book.clone());
    let (_, body) = ok("Book created successfully", json!(book));
    (StatusCode::CREATED, body)
}

async fn update_book(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Json(update): Json<BookUpdate>,
) -> Reply {
    let mut store = store.lock().unwrap();
    let Some(book) = store.books.iter_mut().find(|b| b.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Book not found");
    };
    if let Some(title) = update.title {
        book.title = title;
    }
    if let Some(copies) = update.copies {
        book.copies = copies;
    }
    if let Some(available) = update.available {
        book.available = available;
    }
    book.updated_at = Some(Utc::now());
    ok("Book updated successfully", json!(book))
}

async fn delete_book(State(store): State<Shared>, Path(id): Path<String>) -> Reply {
    let mut store = store.lock().unwrap();
    let before = store.books.len();
    store.books.retain(|b| b.id != id);
    if store.books.len() == before {
        return fail(StatusCode::NOT_FOUND, "Book not found");
    }
    ok("Book deleted successfully", Value::Null)
}

async fn create_borrow(State(store): State<Shared>, Json(input): Json<BorrowInput>) -> Reply {
    let mut store = store.lock().unwrap();
    let Some(book) = store.books.iter_mut().find(|b| b.id == input.book_id) else {
        return fail(StatusCode::NOT_FOUND, "Book not found");
    };
    if input.quantity > book.copies {
        return fail(StatusCode::BAD_REQUEST, "Not enough copies available");
    }
    book.copies -= input.quantity;
    book.available = book.copies > 0;
    let (title, isbn) = (book.title.clone(), book.isbn.clone());

    let entry = store
        .summary
        .entry(input.book_id.clone())
        .or_insert_with(|| BorrowSummary {
            book_id: input.book_id.clone(),
            book_title: title,
            isbn,
            total_quantity_borrowed: 0,
            borrow_count: 0,
        });
    entry.total_quantity_borrowed += input.quantity;
    entry.borrow_count += 1;

    let (_, body) = ok(
        "Book borrowed successfully",
        json!({
            "_id": format!("br{}", entry.borrow_count),
            "bookId": input.book_id,
            "quantity": input.quantity,
            "dueDate": input.due_date,
        }),
    );
    (StatusCode::CREATED, body)
}

async fn borrow_summary(State(store): State<Shared>) -> Reply {
    let mut store = store.lock().unwrap();
    hit(&mut store, "summary");
    let rows: Vec<&BorrowSummary> = store.summary.values().collect();
    ok("Borrowed books summary retrieved successfully", json!(rows))
}

fn seed_book(id: &str, title: &str, copies: u32) -> Book {
    Book {
        id: id.into(),
        title: title.into(),
        author: "Author".into(),
        genre: "FICTION".into(),
        isbn: format!("isbn-{}", id),
        description: String::new(),
        img_url: String::new(),
        copies,
        available: copies > 0,
        created_at: None,
        updated_at: None,
    }
}

/// Start the mock API and return its base URL
async fn spawn_api() -> (String, Shared) {
    let store: Shared = Arc::new(Mutex::new(Store {
        books: vec![seed_book("b1", "The Hobbit", 3), seed_book("b2", "Dune", 1)],
        ..Default::default()
    }));

    let router = Router::new()
        .route("/api/books", get(list_books).post(create_book))
        .route("/api/books/:id", get(get_book).patch(update_book).delete(delete_book))
        .route("/api/borrows", post(create_borrow))
        .route("/api/borrows/summary", get(borrow_summary))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock API");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock API failed");
    });

    (format!("http://{}/api", addr), store)
}

fn state_for(base_url: &str) -> AppState {
    let config = AppConfig::default().with_base_url(Some(base_url.to_string()));
    AppState::new(config).expect("Failed to build client")
}

fn hits(store: &Shared, name: &str) -> usize {
    store.lock().unwrap().hits.get(name).copied().unwrap_or(0)
}

#[tokio::test]
async fn test_list_books_is_cached() {
    let (url, store) = spawn_api().await;
    let state = state_for(&url);

    let first = state.api.list_books(Fetch::Cached).await.unwrap();
    let second = state.api.list_books(Fetch::Cached).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(hits(&store, "list"), 1);

    state.api.list_books(Fetch::Fresh).await.unwrap();
    assert_eq!(hits(&store, "list"), 2);
}

#[tokio::test]
async fn test_delete_refreshes_list() {
    let (url, store) = spawn_api().await;
    let state = state_for(&url);

    let books = state.api.list_books(Fetch::Cached).await.unwrap().data.unwrap();
    assert!(books.iter().any(|b| b.id == "b2"));

    let resp = state.api.delete_book("b2").await.unwrap();
    assert_eq!(resp.message.as_deref(), Some("Book deleted successfully"));

    let books = state.api.list_books(Fetch::Cached).await.unwrap().data.unwrap();
    assert!(!books.iter().any(|b| b.id == "b2"));
    assert_eq!(hits(&store, "list"), 2);
}

#[tokio::test]
async fn test_borrow_refreshes_summary_and_books() {
    let (url, store) = spawn_api().await;
    let state = state_for(&url);

    let summary = state.api.get_borrow_summary(Fetch::Cached).await.unwrap().data.unwrap();
    assert!(summary.is_empty());
    state.api.list_books(Fetch::Cached).await.unwrap();

    let input = BorrowInput {
        book_id: "b1".into(),
        quantity: 2,
        due_date: Utc::now() + Duration::days(7),
    };
    let borrow = state.api.create_borrow(&input).await.unwrap().data.unwrap();
    assert_eq!(borrow.quantity, 2);

    let summary = state.api.get_borrow_summary(Fetch::Cached).await.unwrap().data.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].total_quantity_borrowed, 2);
    assert_eq!(hits(&store, "summary"), 2);

    let books = state.api.list_books(Fetch::Cached).await.unwrap().data.unwrap();
    let hobbit = books.iter().find(|b| b.id == "b1").unwrap();
    assert_eq!(hobbit.copies, 1);
}

#[tokio::test]
async fn test_update_invalidates_record_and_list() {
    let (url, store) = spawn_api().await;
    let state = state_for(&url);

    state.api.get_book("b1", Fetch::Cached).await.unwrap();
    state.api.get_book("b2", Fetch::Cached).await.unwrap();
    state.api.list_books(Fetch::Cached).await.unwrap();

    let update = BookUpdate {
        copies: Some(0),
        available: Some(false),
        ..Default::default()
    };
    state.api.update_book("b1", &update).await.unwrap();

    let book = state.api.get_book("b1", Fetch::Cached).await.unwrap().data.unwrap();
    assert_eq!(book.copies, 0);
    assert!(!book.available);
    // other records stay cached
    state.api.get_book("b2", Fetch::Cached).await.unwrap();
    assert_eq!(hits(&store, "get"), 3);

    let books = state.api.list_books(Fetch::Cached).await.unwrap().data.unwrap();
    assert_eq!(books.iter().find(|b| b.id == "b1").unwrap().copies, 0);
}

#[tokio::test]
async fn test_server_errors_are_normalized() {
    let (url, _store) = spawn_api().await;
    let state = state_for(&url);

    let err = state.api.get_book("missing", Fetch::Cached).await.unwrap_err();
    assert_eq!(err.user_message(), "Book not found");

    let input = BorrowInput {
        book_id: "b2".into(),
        quantity: 5,
        due_date: Utc::now(),
    };
    let err = state.api.create_borrow(&input).await.unwrap_err();
    assert_eq!(err.user_message(), "Not enough copies available");
}

#[tokio::test]
async fn test_ids_are_sent_as_one_path_segment() {
    let (url, store) = spawn_api().await;
    let state = state_for(&url);

    let err = state.api.get_book("b1?x=1", Fetch::Cached).await.unwrap_err();
    assert_eq!(err.user_message(), "Book not found");

    let err = state
        .api
        .delete_book("b1/../../borrows/summary")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Book not found");
    assert_eq!(store.lock().unwrap().books.len(), 2);
}

#[tokio::test]
async fn test_transport_failure_is_normalized() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let state = state_for(&format!("http://{}/api", addr));
    let err = state.api.list_books(Fetch::Cached).await.unwrap_err();
    assert_eq!(err.user_message(), "API Error: FETCH_ERROR");
}

#[tokio::test]
async fn test_create_book_with_zero_copies_is_unavailable() {
    let (url, _store) = spawn_api().await;
    let state = state_for(&url);

    let mut app = App::new(state.clone());
    app.navigate("/create-book").await;
    let Page::CreateBook(form) = app.page_mut() else {
        panic!("expected the create book form");
    };
    form.title = "Empty Shelf".into();
    form.author = "Nobody".into();
    form.genre = "NON_FICTION".into();
    form.isbn = "000".into();
    form.set_copies(0);
    form.set_available(true);

    let submitted = form.submit(&state.api, &state.config.ui).await.unwrap();
    assert_eq!(submitted.notification.to_string(), "Book created successfully");

    let books = state.api.list_books(Fetch::Cached).await.unwrap().data.unwrap();
    let created = books.iter().find(|b| b.title == "Empty Shelf").unwrap();
    assert!(!created.available);
    assert_eq!(created.img_url, state.config.ui.placeholder_image_url);
}

#[tokio::test]
async fn test_app_delete_flow_rerenders_list() {
    let (url, _store) = spawn_api().await;
    let state = state_for(&url);
    let mut app = App::new(state.clone());

    app.navigate("/books").await;
    assert!(app.render().contains("Dune"));

    let Page::List(view) = app.page_mut() else {
        panic!("expected the book list");
    };
    view.request_delete("b2").unwrap();
    view.confirm_delete(&state.api).await.unwrap();

    assert!(app.refresh().await);
    let rendered = app.render();
    assert!(rendered.contains("Book deleted successfully"));
    assert!(!rendered.contains("Dune"));
    assert!(rendered.contains("The Hobbit"));
}

#[tokio::test]
async fn test_app_routes() {
    let (url, _store) = spawn_api().await;
    let mut app = App::new(state_for(&url));

    app.navigate("/").await;
    assert!(app.render().contains("[Available] The Hobbit"));

    app.navigate("/edit-book/b2").await;
    assert!(app.render().contains("Edit Book"));

    app.navigate("/borrow-summary").await;
    assert!(app.render().contains("No books have been borrowed yet."));

    app.navigate("/nowhere").await;
    assert!(app.render().contains("404"));
}
