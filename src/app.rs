//! Phrasebank App
//!
//! Routing, the session guard and the command loop that drives the views.

use phrasebank_lib::commands;
use phrasebank_lib::domain::{CategoryLevel, Difficulty, LargeNode, Material, MaterialType};
use serde::Serialize;

use crate::components::{
    CategoriesPage, CategoryMaterials, CategoryPicker, FilterState, LoginForm, MaterialEditor, MaterialsList,
};
use crate::context::AppContext;
use crate::store::{AppStore, Notice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    /// Query string without the leading '?'
    Materials(String),
    ByCategory(String),
    Categories,
    NewMaterial,
    EditMaterial(u32),
}

impl Route {
    /// None for paths that are not routes
    pub fn parse(input: &str) -> Option<Route> {
        let input = input.trim();
        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let path = path.trim_end_matches('/');
        let route = match path {
            "" => Route::Dashboard,
            "/login" => Route::Login,
            "/materials" => Route::Materials(query.to_string()),
            "/by-category" => Route::ByCategory(query.to_string()),
            "/categories" => Route::Categories,
            "/materials/new" => Route::NewMaterial,
            other => {
                let id = other.strip_prefix("/materials/")?.strip_suffix("/edit")?;
                Route::EditMaterial(id.parse().ok()?)
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        let with_query = |base: &str, query: &str| {
            if query.is_empty() {
                base.to_string()
            } else {
                format!("{}?{}", base, query)
            }
        };
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Materials(query) => with_query("/materials", query),
            Route::ByCategory(query) => with_query("/by-category", query),
            Route::Categories => "/categories".to_string(),
            Route::NewMaterial => "/materials/new".to_string(),
            Route::EditMaterial(id) => format!("/materials/{}/edit", id),
        }
    }

    /// Without a session everything leads to the login page; unknown paths lead home
    pub fn guard(route: Option<Route>, signed_in: bool) -> Route {
        match (route, signed_in) {
            (_, false) => Route::Login,
            (None, true) => Route::Dashboard,
            (Some(route), true) => route,
        }
    }
}

enum View {
    Login(LoginForm),
    Dashboard,
    Materials(MaterialsList),
    ByCategory(CategoryMaterials),
    Categories(CategoriesPage),
    Editor(MaterialEditor),
}

/// What `json` prints
#[derive(Serialize)]
struct Snapshot<'a> {
    route: String,
    materials: Vec<&'a Material>,
}

const HELP: &str = "\
routes: /  /materials[?query]  /by-category[?query]  /categories  /materials/new  /materials/<id>/edit  /login
login: email <addr> | password <pw> | submit
lists: type <sentence|passage|all> | D <A|B|C|all> | L|M|S <id|none> | q <text> | more | delete <id> | edit <id>
categories: add L <name> | add M|S <parent id> <name> | rename <id> <name> | remove <id> | drag <row> <row> | click <row>
editor: set <text|ko|source|type|difficulty> <value> | path add | path remove <n> | path <n> L|M|S <id|none> | save
any: json | logs | logout | help";

pub struct App {
    ctx: AppContext,
    store: AppStore,
    route: Route,
    view: View,
    /// Message from the last action, shown above the view
    flash: Option<String>,
}

fn parse_id(raw: Option<&str>) -> Result<Option<u32>, Notice> {
    match raw {
        None | Some("none") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Notice::Alert(format!("'{}' is not an id", raw))),
    }
}

fn require_id(raw: Option<&str>) -> Result<u32, Notice> {
    parse_id(raw)?.ok_or_else(|| Notice::Alert("An id is required".to_string()))
}

impl App {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            store: AppStore::new(),
            route: Route::Login,
            view: View::Login(LoginForm::new()),
            flash: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Go to `input`, applying the session guard
    pub async fn navigate(&mut self, input: &str) {
        let signed_in = commands::current_session(&self.ctx.state).await.is_some();
        let route = Route::guard(Route::parse(input), signed_in);
        if route != Route::Login {
            self.refresh_tree().await;
        }
        let ctx = &self.ctx;
        let view = match &route {
            Route::Login => View::Login(LoginForm::new()),
            Route::Dashboard => View::Dashboard,
            Route::Materials(query) => View::Materials(MaterialsList::open(ctx, query).await),
            Route::ByCategory(query) => {
                let mut view = CategoryMaterials::new(ctx);
                view.on_url(ctx, query).await;
                View::ByCategory(view)
            }
            Route::Categories => View::Categories(CategoriesPage::new(&self.store.forest)),
            Route::NewMaterial => View::Editor(MaterialEditor::new()),
            Route::EditMaterial(id) => match MaterialEditor::load(ctx, *id).await {
                Ok(editor) => View::Editor(editor),
                Err(notice) => {
                    self.flash = Some(notice.text().to_string());
                    self.route = Route::Materials(String::new());
                    self.view = View::Materials(MaterialsList::open(ctx, "").await);
                    return;
                }
            },
        };
        self.view = view;
        self.route = route;
    }

    async fn refresh_tree(&mut self) {
        match self.store.refresh(&self.ctx).await {
            Ok(true) => self.reconcile().await,
            Ok(false) => {}
            Err(notice) => self.flash = Some(notice.text().to_string()),
        }
    }

    /// Bring the current view in line with a reloaded tree
    async fn reconcile(&mut self) {
        let forest = &self.store.forest;
        match &mut self.view {
            View::Materials(view) => view.reconcile(&self.ctx, forest).await,
            View::ByCategory(view) => view.reconcile(&self.ctx, forest).await,
            View::Categories(page) => page.sync(forest),
            View::Editor(editor) => editor.paths.reconcile(forest),
            View::Login(_) | View::Dashboard => {}
        }
    }

    /// Run one input line and return the rendered screen
    pub async fn handle_line(&mut self, line: &str) -> String {
        let line = line.trim();
        self.flash = None;
        if line.starts_with('/') {
            self.navigate(line).await;
        } else if !line.is_empty() {
            if let Err(notice) = self.act(line).await {
                self.flash = Some(notice.text().to_string());
            }
            self.refresh_tree().await;
        }
        self.render().await
    }

    async fn act(&mut self, line: &str) -> Result<(), Notice> {
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match verb {
            "help" => {
                self.flash = Some(HELP.to_string());
                return Ok(());
            }
            "logout" => {
                commands::sign_out(&self.ctx.state).await;
                self.navigate("/login").await;
                return Ok(());
            }
            "json" => {
                self.flash = Some(self.snapshot()?);
                return Ok(());
            }
            "logs" => {
                let lines = rolling_logger::recent_lines();
                self.flash = Some(if lines.is_empty() {
                    "(no log lines)".to_string()
                } else {
                    lines.join("\n")
                });
                return Ok(());
            }
            "edit" => {
                let id = require_id(Some(rest))?;
                self.navigate(&Route::EditMaterial(id).path()).await;
                return Ok(());
            }
            _ => {}
        }

        let ctx = &self.ctx;
        let forest = &self.store.forest;
        let mut args = rest.split_whitespace();
        match &mut self.view {
            View::Login(form) => match verb {
                "email" => form.identifier = rest.to_string(),
                "password" => form.secret = rest.to_string(),
                "submit" => {
                    form.submit(ctx).await?;
                    self.navigate("/").await;
                }
                _ => return Err(unknown(verb)),
            },
            View::Materials(view) => {
                if let Some(filter) = edit_filter(forest, &view.feed.filter, verb, rest)? {
                    view.apply_filter(ctx, filter).await;
                } else {
                    match verb {
                        "more" => view.feed.load_more(ctx).await,
                        "delete" => view.feed.delete(ctx, require_id(args.next())?).await?,
                        _ => return Err(unknown(verb)),
                    }
                }
            }
            View::ByCategory(view) => {
                if verb == "q" {
                    view.type_search(rest, tokio::time::Instant::now());
                    view.settle_search(ctx).await;
                } else if let Some(filter) = edit_filter(forest, &view.feed.filter, verb, rest)? {
                    view.set_filter(ctx, filter).await;
                } else {
                    match verb {
                        "more" => view.feed.load_more(ctx).await,
                        "delete" => view.feed.delete(ctx, require_id(args.next())?).await?,
                        _ => return Err(unknown(verb)),
                    }
                }
                self.route = Route::ByCategory(view.location.clone());
            }
            View::Categories(page) => match verb {
                "add" => {
                    let level = CategoryLevel::parse(args.next().unwrap_or(""))?;
                    let parent_id = match level {
                        CategoryLevel::Large => None,
                        _ => Some(require_id(args.next())?),
                    };
                    let name = args.collect::<Vec<_>>().join(" ");
                    page.add(ctx, &name, level, parent_id).await?;
                }
                "rename" => {
                    let id = require_id(args.next())?;
                    let name = args.collect::<Vec<_>>().join(" ");
                    page.rename(ctx, id, &name).await?;
                }
                "remove" => page.remove(ctx, require_id(args.next())?).await?,
                "drag" => {
                    let from = require_id(args.next())? as usize;
                    let to = require_id(args.next())? as usize;
                    if page.drag_row(ctx, from, to).await?.is_none() {
                        self.flash = Some("Nothing moved".to_string());
                    }
                }
                "click" => page.click(require_id(args.next())? as usize),
                _ => return Err(unknown(verb)),
            },
            View::Editor(editor) => match verb {
                "set" => {
                    let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                    editor.set_field(field, value.trim())?;
                }
                "path" => match args.next() {
                    Some("add") => editor.paths.add_path(),
                    Some("remove") => {
                        let n = require_id(args.next())? as usize;
                        editor.paths.remove_path(n.saturating_sub(1));
                    }
                    n => {
                        let n = require_id(n)? as usize;
                        let level = CategoryLevel::parse(args.next().unwrap_or(""))?;
                        let id = parse_id(args.next())?;
                        if n == 0 || n > editor.paths.len() {
                            return Err(Notice::Alert(format!("No path {}", n)));
                        }
                        if !editor.paths.select(forest, n - 1, level, id) {
                            return Err(not_a_choice(level, id));
                        }
                    }
                },
                "save" => {
                    let saved = editor.save(ctx).await?;
                    self.flash = Some(format!("Saved #{}", saved.id));
                }
                _ => return Err(unknown(verb)),
            },
            View::Dashboard => return Err(unknown(verb)),
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<String, Notice> {
        let materials = match &self.view {
            View::Materials(view) => view.feed.visible(),
            View::ByCategory(view) => view.feed.visible(),
            _ => Vec::new(),
        };
        let snapshot = Snapshot {
            route: self.route.path(),
            materials,
        };
        serde_json::to_string_pretty(&snapshot).map_err(|e| {
            log::error!("Snapshot failed: {}", e);
            Notice::Banner(crate::store::GENERIC_FAILURE.to_string())
        })
    }

    pub async fn render(&self) -> String {
        let forest = &self.store.forest;
        let names = &self.store.names;
        let body = match &self.view {
            View::Login(form) => form.render(),
            View::Dashboard => self.render_dashboard().await,
            View::Materials(view) => view.render(forest, names),
            View::ByCategory(view) => view.render(forest, names),
            View::Categories(page) => page.render(),
            View::Editor(editor) => editor.render(forest, names),
        };
        let mut out = vec![format!("== {} ==", self.route.path())];
        if let Some(flash) = &self.flash {
            out.push(flash.clone());
        }
        out.push(body);
        out.join("\n")
    }

    async fn render_dashboard(&self) -> String {
        let since = match commands::current_session(&self.ctx.state).await {
            Some(session) => {
                let at = chrono::DateTime::from_timestamp_millis(session.signed_in_at)
                    .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                format!("Signed in as {} since {}", session.identifier, at)
            }
            None => String::new(),
        };
        [
            since,
            format!("{} categories", self.store.categories.len()),
            "/materials  /by-category  /categories  /materials/new".to_string(),
        ]
        .join("\n")
    }
}

fn unknown(verb: &str) -> Notice {
    Notice::Alert(format!("Unknown action '{}' (try `help`)", verb))
}

fn not_a_choice(level: CategoryLevel, id: Option<u32>) -> Notice {
    let id = id.map(|id| id.to_string()).unwrap_or_default();
    Notice::Alert(format!("{} is not a {} choice here", id, level.label()))
}

/// Filter edit for `type`, `D`, `L`/`M`/`S` and `q`; None for other verbs
fn edit_filter(
    forest: &[LargeNode],
    current: &FilterState,
    verb: &str,
    arg: &str,
) -> Result<Option<FilterState>, Notice> {
    let mut filter = current.clone();
    match verb {
        "type" => {
            filter.material_type = match arg {
                "all" | "" => None,
                other => Some(MaterialType::parse(other)?),
            }
        }
        "D" => {
            filter.difficulty = match arg {
                "all" | "" => None,
                other => Some(Difficulty::parse(other)?),
            }
        }
        "L" | "M" | "S" => {
            let level = CategoryLevel::parse(verb)?;
            let id = parse_id(Some(arg).filter(|a| !a.is_empty()))?;
            let mut picker = CategoryPicker::new(filter.path);
            if !picker.select(forest, level, id) {
                return Err(not_a_choice(level, id));
            }
            filter.path = picker.path;
        }
        "q" => filter.q = arg.to_string(),
        _ => return Ok(None),
    }
    Ok(Some(filter))
}
