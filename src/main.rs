//! 程序入口：初始化日志与配置、加载 Slint UI，并完成 VM 绑定

use std::{
    cell::RefCell,
    path::PathBuf,
    rc::Rc,
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};
use tracing_subscriber::fmt::SubscriberBuilder;
use slint::{ComponentHandle, Model, ModelRc, VecModel};

slint::include_modules!();

use json_extract_sim::model::notifications::Notification;
use json_extract_sim::service::openai::{FieldExtractionService, LiveExtractionError, OpenAiClient};
use json_extract_sim::utils;
use json_extract_sim::vm::bridge::*;
use json_extract_sim::{AppConfig, AppState, ExtractionMode};

type LiveOutcome = (u64, Result<String, LiveExtractionError>);

// NotificationData转换实现
impl From<&Notification> for NotificationData {
    fn from(n: &Notification) -> Self {
        Self {
            id: i32::try_from(n.id).unwrap_or(i32::MAX),
            message: n.message.clone().into(),
            severity: n.severity.as_str().into(),
        }
    }
}

/// VM桥接器：管理UI与数据层的交互
struct ViewModelBridge {
    app_state: Rc<RefCell<AppState>>,
    service: Arc<dyn FieldExtractionService>,
    field_model: Rc<VecModel<FieldItem>>,
    notification_model: Rc<VecModel<NotificationData>>,
    live_tx: mpsc::Sender<LiveOutcome>,
    live_rx: Rc<mpsc::Receiver<LiveOutcome>>,
    // 动画时钟：必须与窗口同生命周期
    tick_timer: slint::Timer,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(
        app_window: &AppWindow,
        app_state: Rc<RefCell<AppState>>,
        service: Arc<dyn FieldExtractionService>,
    ) -> Self {
        let (live_tx, live_rx) = mpsc::channel();
        let bridge = Self {
            app_state,
            service,
            field_model: Rc::new(VecModel::default()),
            notification_model: Rc::new(VecModel::default()),
            live_tx,
            live_rx: Rc::new(live_rx),
            tick_timer: slint::Timer::default(),
        };

        // 绑定所有UI回调
        bridge.setup_callbacks(app_window);
        bridge.start_ticking(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        let app_state = self.app_state.clone();

        // === 加载文件回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            let field_model = self.field_model.clone();
            let notification_model = self.notification_model.clone();
            app_window.on_load_file(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_file(&app_window, &app_state, &field_model);
                    Self::sync_notifications(&app_state, &notification_model);
                }
            });
        }

        // === 模式切换回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            let notification_model = self.notification_model.clone();
            app_window.on_toggle_mode(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_state.borrow_mut().toggle_mode();
                    Self::sync_mode(&app_window, &app_state);
                    Self::sync_output(&app_window, &app_state);
                    Self::sync_notifications(&app_state, &notification_model);
                }
            });
        }

        // === 字段勾选回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            let field_model = self.field_model.clone();
            let notification_model = self.notification_model.clone();
            app_window.on_field_toggled(move |name, checked| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_state.borrow_mut().toggle_field(name.as_str(), checked);
                    Self::sync_fields(&app_window, &app_state, &field_model, false);
                    Self::sync_output(&app_window, &app_state);
                    Self::sync_notifications(&app_state, &notification_model);
                }
            });
        }

        // === 实时提取回调（后台线程阻塞请求） ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            let service = self.service.clone();
            let live_tx = self.live_tx.clone();
            app_window.on_extract_live(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_extract_live(&app_window, &app_state, &service, &live_tx);
                }
            });
        }

        // === 实时提取完成回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            let live_rx = self.live_rx.clone();
            app_window.on_live_result(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    while let Ok((id, result)) = live_rx.try_recv() {
                        app_state.borrow_mut().complete_live_extraction(id, result);
                    }
                    Self::sync_mode(&app_window, &app_state);
                    Self::sync_output(&app_window, &app_state);
                }
            });
        }

        // === 复制输出回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_output(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_copy_output(&app_window, &app_state);
                }
            });
        }

        // === 关闭通知回调 ===
        {
            let app_state = app_state.clone();
            let notification_model = self.notification_model.clone();
            app_window.on_dismiss_notification(move |id| {
                if let Ok(id) = u64::try_from(id) {
                    app_state.borrow_mut().dismiss_notification(id);
                }
                Self::sync_notifications(&app_state, &notification_model);
            });
        }
    }

    /// 约一帧推进一次虚拟时钟：驱动打字动画与通知过期
    fn start_ticking(&self, app_window: &AppWindow) {
        let app_state = self.app_state.clone();
        let app_window_weak = app_window.as_weak();
        let notification_model = self.notification_model.clone();
        let mut last = Instant::now();
        self.tick_timer.start(
            slint::TimerMode::Repeated,
            Duration::from_millis(TICK_INTERVAL_MS),
            move || {
                let elapsed_ms = u64::try_from(last.elapsed().as_millis()).unwrap_or(u64::MAX);
                if elapsed_ms == 0 {
                    return;
                }
                last += Duration::from_millis(elapsed_ms);
                app_state.borrow_mut().tick(elapsed_ms);
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::sync_output(&app_window, &app_state);
                    Self::sync_notifications(&app_state, &notification_model);
                }
            },
        );
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_READY.into());
        app_window.set_pending_text(LABEL_PENDING.into());
        app_window.set_field_model(ModelRc::from(self.field_model.clone()));
        app_window.set_notifications(ModelRc::from(self.notification_model.clone()));

        Self::sync_fields(app_window, &self.app_state, &self.field_model, true);
        Self::sync_json(app_window, &self.app_state);
        Self::sync_mode(app_window, &self.app_state);
        Self::sync_output(app_window, &self.app_state);
    }

    /// 显示文件选择对话框
    fn show_file_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("JSON", &["json"])
            .add_filter("All files", &["*"])
            .set_title("Choose JSON File")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    /// 处理加载文件操作
    fn handle_load_file(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        field_model: &Rc<VecModel<FieldItem>>,
    ) {
        let Some(file_path) = Self::show_file_dialog() else {
            return;
        };

        let start_time = Instant::now();
        let load_result = app_state.borrow_mut().load_file(&file_path);
        match load_result {
            Ok(()) => {
                let name = utils::fs::display_name(&file_path);
                app_window.set_file_label(file_label(Some(name.as_str())).into());
                Self::sync_fields(app_window, app_state, field_model, true);
                Self::sync_json(app_window, app_state);
                Self::sync_output(app_window, app_state);
                app_window.set_status_message(STATUS_READY.into());
                tracing::info!("文件加载完成，耗时: {}ms", start_time.elapsed().as_millis());
            }
            Err(e) => {
                // 失败时恢复按钮文字，数据保持不变（通知已由 AppState 发出）
                let label = app_state
                    .borrow()
                    .source_path
                    .as_deref()
                    .map(utils::fs::display_name);
                app_window.set_file_label(file_label(label.as_deref()).into());
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
            }
        }
    }

    /// 处理实时提取：登记请求后在后台线程调用外部服务
    fn handle_extract_live(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        service: &Arc<dyn FieldExtractionService>,
        live_tx: &mpsc::Sender<LiveOutcome>,
    ) {
        let begin = app_state.borrow_mut().begin_live_extraction();
        match begin {
            Ok(live_request) => {
                let service = service.clone();
                let live_tx = live_tx.clone();
                let app_weak = app_window.as_weak();
                std::thread::spawn(move || {
                    let result = service.extract(&live_request.request);
                    if live_tx.send((live_request.id, result)).is_err() {
                        tracing::warn!("UI已关闭，丢弃实时提取结果 #{}", live_request.id);
                        return;
                    }
                    // 使用invoke_from_event_loop安全地回到UI线程
                    let _ = slint::invoke_from_event_loop(move || {
                        if let Some(app) = app_weak.upgrade() {
                            app.invoke_live_result();
                        }
                    });
                });
            }
            Err(e) => {
                tracing::warn!("实时提取未启动: {}", e);
            }
        }
        Self::sync_mode(app_window, app_state);
        Self::sync_output(app_window, app_state);
    }

    /// 复制完整输出（不是打到一半的缓冲区）
    fn handle_copy_output(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let text = app_state.borrow().output_text().to_string();
        match utils::clipboard::copy_to_clipboard(&text) {
            Ok(()) => {
                app_window.set_status_message(STATUS_COPIED.into());
                tracing::info!("输出已复制到剪贴板，长度: {} 字符", text.len());
            }
            Err(e) => {
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
                tracing::error!("复制失败: {}", e);
            }
        }
    }

    /// 同步字段勾选框；rebuild 为 false 时只更新勾选状态，避免在回调中重建行
    fn sync_fields(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        field_model: &Rc<VecModel<FieldItem>>,
        rebuild: bool,
    ) {
        let state = app_state.borrow();
        if rebuild {
            let items: Vec<FieldItem> = state
                .available_fields()
                .iter()
                .map(|f| FieldItem {
                    name: f.as_str().into(),
                    checked: state.is_selected(f),
                })
                .collect();
            field_model.set_vec(items);
        } else {
            for row in 0..field_model.row_count() {
                if let Some(mut item) = field_model.row_data(row) {
                    let checked = state.is_selected(item.name.as_str());
                    if item.checked != checked {
                        item.checked = checked;
                        field_model.set_row_data(row, item);
                    }
                }
            }
        }
        app_window.set_selection_summary(selection_summary(state.target_fields()).into());
    }

    fn sync_json(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        match app_state.borrow().pretty_json() {
            Ok(pretty) => app_window.set_json_text(pretty.into()),
            Err(e) => {
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
                tracing::error!("JSON格式化失败: {}", e);
            }
        }
    }

    fn sync_mode(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let state = app_state.borrow();
        let mode = state.mode();
        app_window.set_live_mode(mode == ExtractionMode::Live);
        app_window.set_mode_label(mode_button_label(mode).into());
        app_window.set_output_title(output_title(mode).into());
        app_window.set_live_pending(state.is_pending());
        app_window.set_live_error(live_error_line(state.live_status()).into());
    }

    /// 输出区：只在缓冲区变化时写入
    fn sync_output(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let state = app_state.borrow();
        let display = state.display_text();
        if app_window.get_output_text().as_str() != display {
            app_window.set_output_text(display.into());
        }
    }

    /// 通知区：id 列表变化时整体替换
    fn sync_notifications(
        app_state: &Rc<RefCell<AppState>>,
        notification_model: &Rc<VecModel<NotificationData>>,
    ) {
        let state = app_state.borrow();
        let current = state.notifications();
        let unchanged = notification_model.row_count() == current.len()
            && current.iter().enumerate().all(|(row, n)| {
                notification_model
                    .row_data(row)
                    .is_some_and(|d| d.id == NotificationData::from(n).id)
            });
        if !unchanged {
            notification_model.set_vec(current.iter().map(NotificationData::from).collect::<Vec<_>>());
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let config = AppConfig::from_env();
    if config.openai.api_key.is_none() {
        tracing::warn!("未设置 OPENAI_API_KEY，实时提取模式将返回错误");
    }

    let app = AppWindow::new()?;
    let state = Rc::new(RefCell::new(AppState::new(&config)));
    let service: Arc<dyn FieldExtractionService> = Arc::new(OpenAiClient::new(config.openai.clone()));

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, state, service);
    bridge.initialize_ui(&app);

    tracing::info!("应用启动成功，UI已初始化");
    app.run()?;
    Ok(())
}
