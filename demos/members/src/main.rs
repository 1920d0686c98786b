use chrono::NaiveDate;
use egui::Color32;
use egui_datatable::datatable_core::column::{EditInput, EditMeta, FooterKind, PinSide};
use egui_datatable::datatable_core::interaction::{Handled, RowHandler};
use egui_datatable::datatable_core::render::build_model;
use egui_datatable::datatable_core::storage::{shared, JsonFileStorage, PersistKey, SharedStorage};
use egui_datatable::datatable_core::toolbar::{ActionProps, ToolbarAction, ToolbarConfig};
use egui_datatable::datatable_core::{
    CellCoord, CellEdit, CellValue, ColumnDescriptor, ColumnSet, RowId, TableStateOptions,
    TableStateStore,
};
use egui_datatable::export::export_csv_dialog;
use egui_datatable::{TableFrontend, TableView, Toolbar};
use log::{info, warn};

const BRANCHES: [&str; 3] = ["Main", "North", "Harbor"];
const FIRST: [&str; 8] = ["Ana", "Ben", "Carla", "Dario", "Elena", "Felix", "Gina", "Hugo"];
const LAST: [&str; 5] = ["Cruz", "Reyes", "Santos", "Lim", "Garcia"];

#[derive(Clone)]
struct Member {
    id: u32,
    name: String,
    branch: &'static str,
    phone: String,
    share_capital: f64,
    joined: NaiveDate,
    active: bool,
}

#[derive(Clone)]
struct Loan {
    no: String,
    member: String,
    product: &'static str,
    principal: f64,
    balance: f64,
    released: NaiveDate,
}

fn sample_members() -> Vec<Member> {
    (1..=42u32)
        .map(|id| {
            let i = id as usize;
            Member {
                id,
                name: format!("{} {}", FIRST[i % FIRST.len()], LAST[(i * 7) % LAST.len()]),
                branch: BRANCHES[i % BRANCHES.len()],
                phone: format!("0917{:07}", id * 7919),
                share_capital: (id * 250 % 9000) as f64 + 0.5 * (id % 3) as f64,
                joined: NaiveDate::from_ymd_opt(2015 + (id % 9) as i32, 1 + id % 12, 1 + id % 28)
                    .unwrap_or_default(),
                active: id % 5 != 0,
            }
        })
        .collect()
}

fn sample_loans(members: &[Member]) -> Vec<Loan> {
    members
        .iter()
        .filter(|m| m.id % 2 == 0)
        .map(|m| {
            let principal = 5000.0 + (m.id * 1375 % 45000) as f64;
            Loan {
                no: format!("LN-{:05}", m.id * 13),
                member: m.name.clone(),
                product: if m.id % 3 == 0 { "Salary" } else { "Business" },
                principal,
                balance: if m.id % 4 == 0 { 0.0 } else { principal * 0.4 },
                released: m.joined + chrono::Duration::days(400),
            }
        })
        .collect()
}

fn member_columns() -> ColumnSet<Member> {
    ColumnSet::with_select([
        ColumnDescriptor::new("member_id", "Member ID", |m: &Member| m.id.into())
            .size(90.0)
            .hideable(false),
        ColumnDescriptor::new("name", "Name", |m: &Member| m.name.as_str().into())
            .size(180.0)
            .editable(EditMeta::new(EditInput::Text)),
        ColumnDescriptor::new("branch", "Branch", |m: &Member| m.branch.into()).editable(
            EditMeta::new(EditInput::Select {
                options: BRANCHES.iter().map(|b| b.to_string()).collect(),
            }),
        ),
        ColumnDescriptor::new("phone", "Phone", |m: &Member| m.phone.as_str().into()),
        ColumnDescriptor::new("share_capital", "Share capital", |m: &Member| m.share_capital.into())
            .number(2)
            .footer(FooterKind::Sum)
            .editable(EditMeta::new(EditInput::Number)),
        ColumnDescriptor::new("joined", "Joined", |m: &Member| m.joined.into()).date("%b %d, %Y"),
        ColumnDescriptor::new("active", "Active", |m: &Member| m.active.into())
            .boolean()
            .editable(EditMeta::new(EditInput::Checkbox)),
    ])
    .expect("member columns")
}

fn loan_columns() -> ColumnSet<Loan> {
    ColumnSet::with_select([
        ColumnDescriptor::new("no", "Loan #", |l: &Loan| l.no.as_str().into())
            .pinned(PinSide::Left)
            .size(100.0)
            .footer(FooterKind::Count),
        ColumnDescriptor::new("member", "Member", |l: &Loan| l.member.as_str().into()).size(180.0),
        ColumnDescriptor::new("product", "Product", |l: &Loan| l.product.into()),
        ColumnDescriptor::new("principal", "Principal", |l: &Loan| l.principal.into())
            .number(2)
            .footer(FooterKind::Sum),
        ColumnDescriptor::new("balance", "Balance", |l: &Loan| l.balance.into())
            .number(2)
            .footer(FooterKind::Sum),
        ColumnDescriptor::new("released", "Released", |l: &Loan| l.released.into())
            .date("%Y-%m-%d"),
        ColumnDescriptor::new("status", "Status", |l: &Loan| (l.balance > 0.0).into())
            .custom(|l| (if l.balance > 0.0 { "Open" } else { "Paid" }).to_string())
            .sortable(false)
            .pinned(PinSide::Right),
    ])
    .expect("loan columns")
}

#[derive(Default)]
struct MemberFrontend {
    last_clicked: Option<u32>,
    profile: Option<u32>,
}

impl RowHandler<Member> for MemberFrontend {
    fn on_row_click(&mut self, row: &Member) {
        self.last_clicked = Some(row.id);
    }

    fn on_double_click(&mut self, row: &Member) -> Handled {
        if row.active {
            Handled::No
        } else {
            self.profile = Some(row.id);
            Handled::Yes
        }
    }
}

impl TableFrontend<Member> for MemberFrontend {
    fn row_context_menu(&mut self, row: &Member, ui: &mut egui::Ui) {
        if ui.button("Open profile").clicked() {
            self.profile = Some(row.id);
            ui.close_menu();
        }
    }

    fn cell_color(&self, row: &Member, coord: &CellCoord) -> Option<Color32> {
        (!row.active && coord.column_id.as_str() == "name").then_some(Color32::GRAY)
    }

    fn cell_tooltip(&self, row: &Member, coord: &CellCoord) -> Option<String> {
        (coord.column_id.as_str() == "phone").then(|| format!("Call {}", row.name))
    }

    fn right_toolbar_ui(&mut self, ui: &mut egui::Ui) {
        if let Some(id) = self.last_clicked {
            ui.weak(format!("last clicked #{id}"));
        }
    }
}

#[derive(PartialEq)]
enum Tab {
    Members,
    Loans,
}

struct MembersApp {
    tab: Tab,
    members: Vec<Member>,
    member_store: TableStateStore<Member>,
    member_view: TableView,
    member_toolbar: Toolbar,
    member_frontend: MemberFrontend,
    loans: Vec<Loan>,
    loan_store: TableStateStore<Loan>,
    loan_view: TableView,
    loan_toolbar: Toolbar,
    status: String,
}

impl MembersApp {
    fn new(storage: SharedStorage) -> Self {
        let members = sample_members();
        let loans = sample_loans(&members);
        let member_options = TableStateOptions::new(
            PersistKey::new(["members", "view", "regular"]),
            member_columns(),
            |m: &Member| m.id.into(),
        )
        .default_column_visibility([("phone", false)])
        .on_select_data(|rows: &[&Member]| {
            let capital: f64 = rows.iter().map(|m| m.share_capital).sum();
            info!("{} members selected, share capital {capital:.2}", rows.len());
        });
        let loan_options = TableStateOptions::new(
            PersistKey::new(["loans", "view"]),
            loan_columns(),
            |l: &Loan| l.no.as_str().into(),
        )
        .enable_multi_sort(true)
        .page_size(15);

        MembersApp {
            tab: Tab::Members,
            members,
            member_store: TableStateStore::new(member_options, storage.clone()),
            member_view: TableView::new(),
            member_toolbar: Toolbar::new(
                ToolbarConfig {
                    has_right_content: true,
                    ..ToolbarConfig::default()
                }
                .create(ActionProps::new("New member"))
                .delete(ActionProps::new("Delete"))
                .refresh(ActionProps::new("Refresh"))
                .export(ActionProps::new("Export")),
            ),
            member_frontend: MemberFrontend::default(),
            loans,
            loan_store: TableStateStore::new(loan_options, storage),
            loan_view: TableView::new(),
            loan_toolbar: Toolbar::new(
                ToolbarConfig {
                    hide_delete: true,
                    ..ToolbarConfig::default()
                }
                .delete(ActionProps::new("Delete"))
                .export(ActionProps::new("Export")),
            ),
            status: String::new(),
        }
    }

    fn members_ui(&mut self, ui: &mut egui::Ui) {
        let total = self.member_store.load_client_side(self.members.clone());
        let action = self
            .member_toolbar
            .show(&mut self.member_store, &mut self.member_frontend, ui);
        match action {
            Some(ToolbarAction::Create) => {
                let id = self.members.iter().map(|m| m.id).max().unwrap_or_default() + 1;
                self.members.push(Member {
                    id,
                    name: format!("New member {id}"),
                    branch: BRANCHES[0],
                    phone: String::new(),
                    share_capital: 0.0,
                    joined: chrono::Local::now().date_naive(),
                    active: true,
                });
                self.status = format!("created member #{id}");
            }
            Some(ToolbarAction::DeleteSelected) => {
                let selected = self.member_store.selected_row_ids();
                self.members.retain(|m| !selected.contains(&RowId::from(m.id)));
                self.member_store.clear_selection();
                self.status = format!("deleted {} members", selected.len());
            }
            Some(ToolbarAction::Export) => {
                self.status = export_status(export_csv_dialog(
                    &build_model(&self.member_store),
                    "members.csv",
                ));
            }
            Some(ToolbarAction::Refresh) => {
                self.member_store.clear_column_types();
                self.status = "refreshed".into();
            }
            None => {}
        }
        ui.separator();
        let response = self
            .member_view
            .show(&mut self.member_store, &mut self.member_frontend, ui);
        for edit in response.edits {
            apply_member_edit(&mut self.members, edit);
        }
        pagination_ui(&mut self.member_store, total, ui);

        if let Some(id) = self.member_frontend.profile {
            let mut open = true;
            egui::Window::new("Member profile")
                .open(&mut open)
                .show(ui.ctx(), |ui| match self.members.iter().find(|m| m.id == id) {
                    Some(m) => {
                        ui.heading(&m.name);
                        ui.label(format!("{} branch, joined {}", m.branch, m.joined));
                        ui.label(format!("Share capital {:.2}", m.share_capital));
                    }
                    None => {
                        ui.label("Member no longer exists");
                    }
                });
            if !open {
                self.member_frontend.profile = None;
            }
        }
    }

    fn loans_ui(&mut self, ui: &mut egui::Ui) {
        let total = self.loan_store.load_client_side(self.loans.clone());
        if let Some(ToolbarAction::Export) = self.loan_toolbar.show(&mut self.loan_store, &mut (), ui) {
            self.status = export_status(export_csv_dialog(&build_model(&self.loan_store), "loans.csv"));
        }
        ui.separator();
        self.loan_view.show(&mut self.loan_store, &mut (), ui);
        pagination_ui(&mut self.loan_store, total, ui);
    }
}

fn export_status(result: Result<Option<std::path::PathBuf>, egui_datatable::export::ExportError>) -> String {
    match result {
        Ok(Some(path)) => format!("exported to {}", path.display()),
        Ok(None) => "export cancelled".into(),
        Err(e) => {
            warn!("export failed: {e}");
            format!("export failed: {e}")
        }
    }
}

fn apply_member_edit(members: &mut [Member], edit: CellEdit) {
    let Some(member) = members
        .iter_mut()
        .find(|m| RowId::from(m.id) == edit.coord.row_id)
    else {
        return;
    };
    match (edit.coord.column_id.as_str(), edit.value) {
        ("name", CellValue::Str(name)) => member.name = name,
        ("branch", CellValue::Str(branch)) => {
            if let Some(b) = BRANCHES.iter().find(|b| **b == branch) {
                member.branch = b;
            }
        }
        ("share_capital", value) => member.share_capital = value.as_f64().unwrap_or_default(),
        ("active", value) => member.active = value.as_bool().unwrap_or(member.active),
        (column, value) => warn!("ignoring edit of {column} to {value}"),
    }
}

fn pagination_ui<R>(store: &mut TableStateStore<R>, total: usize, ui: &mut egui::Ui) {
    let pagination = store.pagination();
    let pages = pagination.page_count(total);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(pagination.page_index > 0, egui::Button::new("◀"))
            .clicked()
        {
            store.set_page(pagination.page_index - 1);
        }
        ui.label(format!("Page {} of {pages}, {total} rows", pagination.page_index + 1));
        if ui
            .add_enabled(pagination.page_index + 1 < pages, egui::Button::new("▶"))
            .clicked()
        {
            store.set_page(pagination.page_index + 1);
        }
        egui::ComboBox::from_id_salt(store.persist_key().storage_key())
            .selected_text(format!("{} / page", pagination.page_size))
            .show_ui(ui, |ui| {
                for size in [10, 15, 25, 50] {
                    if ui
                        .selectable_label(pagination.page_size == size, size.to_string())
                        .clicked()
                    {
                        store.set_page_size(size);
                    }
                }
            });
        let params = store.query_params();
        ui.weak(format!("sort={} filter={}", params.sort, params.filter));
    });
}

impl eframe::App for MembersApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("MenuBar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.tab, Tab::Members, "Members");
                ui.selectable_value(&mut self.tab, Tab::Loans, "Loans");
                ui.separator();
                egui::widgets::global_theme_preference_buttons(ui);
                ui.separator();
                ui.weak(self.status.as_str());
            })
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Members => self.members_ui(ui),
            Tab::Loans => self.loans_ui(ui),
        });
    }
}

fn main() {
    use eframe::App;

    env_logger::init();
    let state_file = std::env::temp_dir().join("egui_datatable_members.json");
    info!("table state in {state_file:?}");
    let storage = shared(JsonFileStorage::open(state_file));

    eframe::run_simple_native(
        "Members Demo",
        eframe::NativeOptions {
            centered: true,
            ..Default::default()
        },
        {
            let mut app = MembersApp::new(storage);
            move |ctx, frame| {
                app.update(ctx, frame);
            }
        },
    )
    .unwrap();
}
