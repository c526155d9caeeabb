//! Owns the drawer collection and turns user commands into mutations,
//! notices, icon requests and debounced saves

use crate::debounce::Debouncer;
use crate::dragdrop::DropPayload;
use crate::icons::{IconLoader, IconReady};
use crate::model::{
    ChangeEvent, Drawer, DrawerCollection, DrawerError, EditTarget, ItemId, ShortcutItem,
};
use crate::platform::{PlatformError, PlatformShell};
use crate::prompt::{Notice, Prompt};
use crate::resolver::ShortcutResolver;
use crate::settings::{apply_run_at_startup, ClickKind, Settings, SettingsStore};
use crate::store::DrawerStore;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drawers created when the store holds nothing
pub const SAMPLE_DRAWERS: [&str; 2] = ["常用软件", "我的文档"];

/// Outcome of adding a batch of paths to a drawer
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<ItemId>,
    /// Display names skipped because the drawer already holds their target
    pub duplicates: Vec<String>,
}

pub struct Coordinator {
    drawers: DrawerCollection,
    store: Box<dyn DrawerStore>,
    resolver: Arc<dyn ShortcutResolver>,
    icons: IconLoader,
    shell: Arc<dyn PlatformShell>,
    prompt: Box<dyn Prompt>,
    save_timer: Debouncer,
    subscribers: Vec<Sender<ChangeEvent>>,
    saves: usize,
}

impl Coordinator {
    pub fn new(
        store: impl DrawerStore + 'static,
        resolver: Arc<dyn ShortcutResolver>,
        icons: IconLoader,
        shell: Arc<dyn PlatformShell>,
        prompt: impl Prompt + 'static,
    ) -> Self {
        let mut drawers = DrawerCollection::new(store.load());

        if drawers.is_empty() {
            for name in SAMPLE_DRAWERS {
                if let Err(e) = drawers.add_drawer(name) {
                    log::warn!("Failed to seed drawer {}: {}", name, e);
                }
            }
            log::info!("Seeded {} sample drawers", drawers.len());
        } else {
            for item in drawers.iter_items() {
                icons.request(item.id, &item.path);
            }
            log::info!("Restoring icons for {} shortcuts", icons.pending());
        }

        Self {
            drawers,
            store: Box::new(store),
            resolver,
            icons,
            shell,
            prompt: Box::new(prompt),
            save_timer: Debouncer::default(),
            subscribers: Vec::new(),
            saves: 0,
        }
    }

    /// Replace the auto-save quiet interval
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_timer = Debouncer::new(delay);
        self
    }

    /// Stream of change events for a UI layer
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn drawers(&self) -> &[Drawer] {
        self.drawers.drawers()
    }

    pub fn drawer(&self, index: usize) -> Option<&Drawer> {
        self.drawers.get(index)
    }

    /// Case-insensitive drawer lookup
    pub fn drawer_index(&self, name: &str) -> Option<usize> {
        self.drawers.drawer_index(name)
    }

    pub fn item(&self, id: ItemId) -> Option<&ShortcutItem> {
        self.drawers.find_item(id)
    }

    /// Number of times the collection has been written
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn is_save_pending(&self) -> bool {
        self.save_timer.is_armed()
    }

    fn emit(&mut self, event: ChangeEvent) {
        log::debug!("{:?}", event);
        self.save_timer.touch(Instant::now());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn save(&mut self) {
        self.store.save(self.drawers.drawers());
        self.saves += 1;
    }

    /// Resolve each path and append it to the drawer, skipping duplicates
    pub fn add_shortcuts<P: AsRef<Path>>(&mut self, paths: &[P], drawer_index: usize) -> AddReport {
        let mut report = AddReport::default();
        if self.drawers.get(drawer_index).is_none() {
            log::warn!("Ignoring drop onto unknown drawer {}", drawer_index);
            return report;
        }

        for path in paths {
            let path = path.as_ref();
            let original = path.to_string_lossy();
            let resolution = self.resolver.resolve(&original);
            let item = ShortcutItem::new(
                display_name(path),
                resolution.target_path,
                resolution.arguments,
            );

            match self.drawers.add_shortcut(drawer_index, item) {
                Ok(event) => {
                    if let ChangeEvent::ShortcutAdded { id, .. } = event {
                        if let Some(item) = self.drawers.find_item(id) {
                            self.icons.request(id, &item.path);
                        }
                        report.added.push(id);
                    }
                    self.emit(event);
                }
                Err(DrawerError::DuplicateShortcut { name, drawer }) => {
                    log::info!("Skipping duplicate {} in {}", name, drawer);
                    self.prompt.notify(&Notice::DuplicateShortcut {
                        name: name.clone(),
                        drawer,
                    });
                    report.duplicates.push(name);
                }
                Err(e) => log::warn!("Cannot add {}: {}", original, e),
            }
        }
        report
    }

    /// Blank names are ignored; duplicates are reported to the user
    pub fn add_drawer(&mut self, name: &str) -> bool {
        match self.drawers.add_drawer(name) {
            Ok(event) => {
                log::info!("Added drawer {}", name.trim());
                self.emit(event);
                true
            }
            Err(DrawerError::DuplicateDrawer(name)) => {
                self.prompt.notify(&Notice::DuplicateDrawer { name });
                false
            }
            Err(_) => false,
        }
    }

    /// Asks for confirmation first; a decline leaves everything untouched
    pub fn delete_drawer(&mut self, index: usize) -> bool {
        let Some(drawer) = self.drawers.get(index) else {
            return false;
        };
        let question = format!(
            "Delete drawer '{}' and its {} shortcut(s)?",
            drawer.name,
            drawer.items.len()
        );
        if !self.prompt.confirm(&question) {
            return false;
        }

        match self.drawers.remove_drawer(index) {
            Some((drawer, event)) => {
                log::info!("Deleted drawer {}", drawer.name);
                self.emit(event);
                true
            }
            None => false,
        }
    }

    pub fn delete_shortcut(&mut self, id: ItemId) -> bool {
        match self.drawers.remove_shortcut(id) {
            Some((item, event)) => {
                log::info!("Deleted shortcut {}", item.name);
                self.emit(event);
                true
            }
            None => false,
        }
    }

    pub fn start_editing(&mut self, target: EditTarget) -> bool {
        self.drawers.set_editing(target, true)
    }

    pub fn end_editing(&mut self, target: EditTarget) -> bool {
        self.drawers.set_editing(target, false)
    }

    /// Blank names keep the old name; another drawer's name is refused
    pub fn rename_drawer(&mut self, index: usize, name: &str) -> bool {
        match self.drawers.rename_drawer(index, name) {
            Ok(event) => {
                self.emit(event);
                true
            }
            Err(DrawerError::DuplicateDrawer(name)) => {
                self.prompt.notify(&Notice::DuplicateDrawer { name });
                false
            }
            Err(_) => false,
        }
    }

    pub fn rename_shortcut(&mut self, id: ItemId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.drawers.rename_shortcut(id, name) {
            Some(event) => {
                self.emit(event);
                true
            }
            None => false,
        }
    }

    pub fn set_expanded(&mut self, index: usize, expanded: bool) -> bool {
        match self.drawers.set_expanded(index, expanded) {
            Some(event) => {
                self.emit(event);
                true
            }
            None => false,
        }
    }

    /// Apply a drop from the UI. Returns whether anything changed.
    pub fn handle_drop(&mut self, payload: DropPayload) -> bool {
        match payload {
            DropPayload::Shortcut {
                from_drawer,
                from_index,
                to_drawer,
                to_index,
            } => match self
                .drawers
                .move_shortcut(from_drawer, from_index, to_drawer, to_index)
            {
                Some(event) => {
                    self.emit(event);
                    true
                }
                None => false,
            },
            DropPayload::Drawer {
                from_index,
                to_index,
            } => match self.drawers.move_drawer(from_index, to_index) {
                Some(event) => {
                    self.emit(event);
                    true
                }
                None => false,
            },
            DropPayload::Files { paths, drawer } => {
                !self.add_shortcuts(&paths, drawer).added.is_empty()
            }
        }
    }

    /// Open the shortcut's target. Items without a path do nothing.
    pub fn launch(&mut self, id: ItemId) -> bool {
        let Some(item) = self.drawers.find_item(id) else {
            return false;
        };
        if item.path.trim().is_empty() {
            return false;
        }

        log::info!("Launching {}", item.path);
        match self
            .shell
            .launch(Path::new(&item.path), item.arguments.as_deref())
        {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                self.prompt.notify(&launch_failed(&item.path, e));
                false
            }
        }
    }

    /// Launch if this click kind is the configured open gesture
    pub fn activate(&mut self, id: ItemId, click: ClickKind, settings: &Settings) -> bool {
        settings.should_launch(click) && self.launch(id)
    }

    /// Show the target in the file browser
    pub fn reveal(&mut self, id: ItemId) -> bool {
        let Some(item) = self.drawers.find_item(id) else {
            return false;
        };
        let path = Path::new(&item.path);
        if item.path.trim().is_empty() || !path.exists() {
            self.prompt.notify(&Notice::TargetMissing {
                path: item.path.clone(),
            });
            return false;
        }

        match self.shell.reveal(path) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                self.prompt.notify(&launch_failed(&item.path, e));
                false
            }
        }
    }

    /// Toggle login startup, telling the user when the OS refuses
    pub fn set_run_at_startup(&self, settings: &mut Settings, enabled: bool) -> bool {
        match apply_run_at_startup(settings, enabled, self.shell.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                self.prompt.notify(&Notice::StartupFailed {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Save once the quiet interval after the last change has passed
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if self.save_timer.poll(now) {
            self.save();
            true
        } else {
            false
        }
    }

    /// Save right away and drop any pending deadline
    pub fn flush(&mut self) {
        self.save_timer.cancel();
        self.save();
    }

    pub fn shutdown(&mut self, settings_store: &SettingsStore, settings: &Settings) {
        self.flush();
        settings_store.save(settings);
        log::info!("Saved drawers and settings");
    }

    fn apply_icon(&mut self, ready: IconReady) -> bool {
        let Some(icon) = ready.icon else {
            return false;
        };
        match self.drawers.find_item_mut(ready.id) {
            Some(item) => {
                item.icon = Some(icon);
                true
            }
            None => false,
        }
    }

    /// Attach every icon that has arrived; results for deleted items are dropped
    pub fn pump_icons(&mut self) -> usize {
        let mut applied = 0;
        while let Some(ready) = self.icons.try_recv_ready() {
            if self.apply_icon(ready) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every requested icon has arrived or `timeout` passes
    pub fn wait_for_icons(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while self.icons.pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("{} icons still loading", self.icons.pending());
                break;
            }
            match self.icons.recv_ready_timeout(remaining) {
                Some(ready) => {
                    if self.apply_icon(ready) {
                        applied += 1;
                    }
                }
                None => break,
            }
        }
        applied + self.pump_icons()
    }

    pub fn pending_icons(&self) -> usize {
        self.icons.pending()
    }
}

fn launch_failed(path: &str, e: PlatformError) -> Notice {
    let reason = match e {
        PlatformError::Launch { reason, .. } => reason,
        other => other.to_string(),
    };
    Notice::LaunchFailed {
        path: path.to_string(),
        reason,
    }
}

/// File stem of the dropped path, falling back to the whole name
fn display_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::{IconImage, TieredIconProvider};
    use crate::platform::testing::FakeShell;
    use crate::prompt::testing::RecordingPrompt;
    use crate::resolver::SystemResolver;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct MemoryStore {
        drawers: RefCell<Vec<Drawer>>,
        saves: Cell<usize>,
    }

    impl DrawerStore for MemoryStore {
        fn load(&self) -> Vec<Drawer> {
            self.drawers.borrow().clone()
        }

        fn save(&self, drawers: &[Drawer]) {
            *self.drawers.borrow_mut() = drawers.to_vec();
            self.saves.set(self.saves.get() + 1);
        }
    }

    struct Harness {
        coordinator: Coordinator,
        store: Rc<MemoryStore>,
        shell: Arc<FakeShell>,
        prompt: Rc<RecordingPrompt>,
        dir: tempfile::TempDir,
    }

    impl Harness {
        fn file(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, name).unwrap();
            path
        }
    }

    fn harness_with(initial: Vec<Drawer>, shell: FakeShell) -> Harness {
        let store = Rc::new(MemoryStore::default());
        *store.drawers.borrow_mut() = initial;
        let shell = Arc::new(shell);
        let prompt = Rc::new(RecordingPrompt::answering(true));
        let provider = Arc::new(TieredIconProvider::new(shell.clone(), 32));
        let coordinator = Coordinator::new(
            store.clone(),
            Arc::new(SystemResolver::new(shell.clone())),
            IconLoader::new(provider, 2),
            shell.clone(),
            prompt.clone(),
        );
        Harness {
            coordinator,
            store,
            shell,
            prompt,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn harness() -> Harness {
        harness_with(vec![Drawer::new("Tools")], FakeShell::default())
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_millis(600)
    }

    #[test]
    fn test_empty_store_seeds_sample_drawers() {
        let mut h = harness_with(Vec::new(), FakeShell::default());
        let names: Vec<_> = h.coordinator.drawers().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, SAMPLE_DRAWERS);
        assert!(h.coordinator.drawers().iter().all(|d| d.items.is_empty()));
        assert!(!h.coordinator.is_save_pending());
        assert_eq!(h.store.saves.get(), 0);

        h.coordinator.flush();
        assert_eq!(h.store.drawers.borrow().len(), 2);
    }

    #[test]
    fn test_duplicate_drawer_rejected_case_insensitively() {
        let mut h = harness_with(Vec::new(), FakeShell::default());
        assert!(h.coordinator.add_drawer("Work"));
        assert!(!h.coordinator.add_drawer("work"));
        assert_eq!(h.coordinator.drawers().len(), 3);
        assert_eq!(
            h.prompt.notices(),
            vec![Notice::DuplicateDrawer {
                name: "work".into()
            }]
        );

        // Blank names are dropped without a notice
        assert!(!h.coordinator.add_drawer("   "));
        assert_eq!(h.prompt.notices().len(), 1);
    }

    #[test]
    fn test_delete_drawer_needs_confirmation() {
        let mut h = harness();
        h.coordinator.add_drawer("Games");

        h.coordinator.flush();
        h.prompt.answer.set(false);
        assert!(!h.coordinator.delete_drawer(1));
        assert_eq!(h.coordinator.drawers().len(), 2);
        assert!(!h.coordinator.is_save_pending());
        assert!(!h.coordinator.tick_at(later()));
        assert_eq!(h.store.saves.get(), 1);

        h.prompt.answer.set(true);
        assert!(h.coordinator.delete_drawer(1));
        assert_eq!(h.coordinator.drawers().len(), 1);
        assert_eq!(h.prompt.questions().len(), 2);
        assert!(h.prompt.questions()[0].contains("Games"));

        assert!(!h.coordinator.delete_drawer(7));
        assert_eq!(h.prompt.questions().len(), 2);
    }

    #[test]
    fn test_add_shortcuts_skips_duplicates() {
        let mut h = harness();
        let editor = h.file("Editor.exe");
        let notes = h.file("notes.txt");

        let report = h.coordinator.add_shortcuts(&[editor.clone(), notes], 0);
        assert_eq!(report.added.len(), 2);

        let upper = PathBuf::from(editor.to_string_lossy().to_uppercase());
        let report = h.coordinator.add_shortcuts(&[editor, upper], 0);
        assert!(report.added.is_empty());
        assert_eq!(report.duplicates.len(), 2);

        let drawer = h.coordinator.drawer(0).unwrap();
        assert_eq!(drawer.items.len(), 2);
        assert_eq!(drawer.items[0].name, "Editor");
        assert_eq!(
            h.prompt.notices()[0],
            Notice::DuplicateShortcut {
                name: "Editor".into(),
                drawer: "Tools".into()
            }
        );
    }

    #[test]
    fn test_link_is_stored_as_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("Browser.lnk");
        fs::write(&link, b"L").unwrap();
        let shell = FakeShell::default().with_link(
            &link.to_string_lossy(),
            r"C:\Program Files\Browser\browser.exe",
            Some("  --incognito "),
        );
        let mut h = harness_with(vec![Drawer::new("Tools")], shell);

        let report = h.coordinator.add_shortcuts(&[link], 0);
        let item = h.coordinator.item(report.added[0]).unwrap();
        assert_eq!(item.name, "Browser");
        assert_eq!(item.path, r"C:\Program Files\Browser\browser.exe");
        assert_eq!(item.arguments.as_deref(), Some("--incognito"));
    }

    #[test]
    fn test_unknown_drawer_index_is_ignored() {
        let mut h = harness();
        let file = h.file("a.txt");
        let report = h.coordinator.add_shortcuts(&[file], 5);
        assert_eq!(report, AddReport::default());
        assert!(!h.coordinator.is_save_pending());
    }

    #[test]
    fn test_mutations_coalesce_into_one_save() {
        let mut h = harness();
        let a = h.file("a.txt");
        let b = h.file("b.txt");

        h.coordinator.add_drawer("Docs");
        h.coordinator.add_shortcuts(&[a, b], 1);
        h.coordinator.set_expanded(1, false);
        h.coordinator.handle_drop(DropPayload::Drawer {
            from_index: 1,
            to_index: 0,
        });
        assert!(!h.coordinator.tick());
        assert_eq!(h.store.saves.get(), 0);

        assert!(h.coordinator.tick_at(later()));
        assert!(!h.coordinator.tick_at(later()));
        assert_eq!(h.store.saves.get(), 1);
        assert_eq!(h.store.drawers.borrow()[0].name, "Docs");
        assert!(!h.store.drawers.borrow()[0].is_expanded);

        h.coordinator.rename_drawer(0, "Documents");
        assert!(h.coordinator.tick_at(later()));
        assert_eq!(h.coordinator.save_count(), 2);
        assert_eq!(h.store.drawers.borrow()[0].name, "Documents");
    }

    #[test]
    fn test_custom_save_delay() {
        let Harness {
            coordinator, store, ..
        } = harness();
        let mut coordinator = coordinator.with_save_delay(Duration::from_secs(5));

        coordinator.add_drawer("Docs");
        assert!(!coordinator.tick_at(later()));
        assert!(coordinator.tick_at(Instant::now() + Duration::from_secs(6)));
        assert_eq!(store.saves.get(), 1);
    }

    #[test]
    fn test_flush_and_shutdown() {
        let mut h = harness();
        h.coordinator.add_drawer("Docs");
        h.coordinator.flush();
        assert_eq!(h.store.saves.get(), 1);
        assert!(!h.coordinator.tick_at(later()));

        let settings_store = SettingsStore::in_dir(h.dir.path());
        let mut settings = Settings::default();
        settings.is_locked = true;
        h.coordinator.shutdown(&settings_store, &settings);
        assert_eq!(h.store.saves.get(), 2);
        assert!(settings_store.try_load().unwrap().is_locked);
    }

    #[test]
    fn test_rename_drawer_to_existing_name_is_refused() {
        let mut h = harness();
        h.coordinator.add_drawer("Docs");
        assert!(!h.coordinator.rename_drawer(1, "TOOLS"));
        assert_eq!(h.coordinator.drawer(1).unwrap().name, "Docs");
        assert!(h.coordinator.rename_drawer(1, "docs"));
        assert!(!h.coordinator.rename_drawer(1, "  "));
        assert_eq!(h.coordinator.drawer(1).unwrap().name, "docs");
        assert_eq!(h.prompt.notices().len(), 1);
    }

    #[test]
    fn test_editing_and_shortcut_rename() {
        let mut h = harness();
        let file = h.file("a.txt");
        let id = h.coordinator.add_shortcuts(&[file], 0).added[0];

        assert!(h.coordinator.start_editing(EditTarget::Shortcut(id)));
        assert!(h.coordinator.item(id).unwrap().is_editing);
        assert!(h.coordinator.rename_shortcut(id, " Alpha "));
        assert!(h.coordinator.end_editing(EditTarget::Shortcut(id)));
        let item = h.coordinator.item(id).unwrap();
        assert_eq!(item.name, "Alpha");
        assert!(!item.is_editing);
        assert!(!h.coordinator.rename_shortcut(id, ""));
        assert!(!h.coordinator.start_editing(EditTarget::Drawer(9)));
    }

    #[test]
    fn test_launch_and_activate() {
        let mut h = harness();
        let file = h.file("a.txt");
        let id = h.coordinator.add_shortcuts(&[file.clone()], 0).added[0];

        let settings = Settings::default();
        assert!(!h.coordinator.activate(id, ClickKind::Single, &settings));
        assert!(h.shell.launched().is_empty());
        assert!(h.coordinator.activate(id, ClickKind::Double, &settings));
        assert_eq!(h.shell.launched(), vec![(file, None)]);
        assert!(!h.coordinator.launch(ItemId::next()));
    }

    #[test]
    fn test_launch_of_empty_path_is_a_no_op() {
        let mut blank = Drawer::new("Tools");
        blank.items.push(ShortcutItem::new("nothing", "", None));
        let id = blank.items[0].id;
        let mut h = harness_with(vec![blank], FakeShell::default());
        h.coordinator.wait_for_icons(Duration::from_secs(5));

        assert!(!h.coordinator.launch(id));
        assert!(h.shell.launched().is_empty());
        assert!(h.prompt.notices().is_empty());
    }

    #[test]
    fn test_launch_failure_is_reported() {
        let mut shell = FakeShell::default();
        shell.fail_launch = true;
        let mut h = harness_with(vec![Drawer::new("Tools")], shell);
        let file = h.file("a.txt");
        let id = h.coordinator.add_shortcuts(&[file.clone()], 0).added[0];

        assert!(!h.coordinator.launch(id));
        assert_eq!(
            h.prompt.notices(),
            vec![Notice::LaunchFailed {
                path: file.to_string_lossy().to_string(),
                reason: "no handler".into()
            }]
        );
    }

    #[test]
    fn test_reveal_missing_target() {
        let mut h = harness();
        let file = h.file("gone.txt");
        let id = h.coordinator.add_shortcuts(&[file.clone()], 0).added[0];

        assert!(h.coordinator.reveal(id));
        assert_eq!(h.shell.revealed(), vec![file.clone()]);

        fs::remove_file(&file).unwrap();
        assert!(!h.coordinator.reveal(id));
        assert!(matches!(
            h.prompt.notices().last(),
            Some(Notice::TargetMissing { .. })
        ));
    }

    #[test]
    fn test_delete_shortcut() {
        let mut h = harness();
        let file = h.file("a.txt");
        let id = h.coordinator.add_shortcuts(&[file], 0).added[0];
        assert!(h.coordinator.delete_shortcut(id));
        assert!(!h.coordinator.delete_shortcut(id));
        assert!(h.coordinator.drawer(0).unwrap().items.is_empty());
    }

    #[test]
    fn test_handle_drop_variants() {
        let mut h = harness();
        h.coordinator.add_drawer("Docs");
        let files = vec![h.file("a.txt"), h.file("b.txt"), h.file("c.txt")];

        assert!(h.coordinator.handle_drop(DropPayload::Files {
            paths: files,
            drawer: 0
        }));
        assert!(h.coordinator.handle_drop(DropPayload::Shortcut {
            from_drawer: 0,
            from_index: 0,
            to_drawer: 0,
            to_index: 3,
        }));
        let names: Vec<_> = h.coordinator.drawer(0).unwrap().items.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, ["b", "c", "a"]);

        assert!(h.coordinator.handle_drop(DropPayload::Shortcut {
            from_drawer: 0,
            from_index: 1,
            to_drawer: 1,
            to_index: 10,
        }));
        assert_eq!(h.coordinator.drawer(1).unwrap().items[0].name, "c");

        assert!(!h.coordinator.handle_drop(DropPayload::Shortcut {
            from_drawer: 0,
            from_index: 9,
            to_drawer: 1,
            to_index: 0,
        }));
        assert!(!h.coordinator.handle_drop(DropPayload::Drawer {
            from_index: 0,
            to_index: 0,
        }));
        assert!(!h.coordinator.handle_drop(DropPayload::Files {
            paths: Vec::new(),
            drawer: 4,
        }));
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut h = harness();
        let rx = h.coordinator.subscribe();
        let dropped = h.coordinator.subscribe();
        drop(dropped);

        h.coordinator.add_drawer("Docs");
        h.coordinator.set_expanded(1, false);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ChangeEvent::DrawerAdded { index: 1 },
                ChangeEvent::DrawerExpanded {
                    index: 1,
                    expanded: false
                },
            ]
        );
        assert_eq!(h.coordinator.subscribers.len(), 1);
    }

    #[test]
    fn test_icons_restored_on_load() {
        let mut tools = Drawer::new("Tools");
        for n in 0..5 {
            tools
                .items
                .push(ShortcutItem::new(format!("app{}", n), format!("/missing/app{}", n), None));
        }
        let mut h = harness_with(vec![tools], FakeShell::with_shell_icon(IconImage::solid(8, [1, 2, 3, 255])));

        let applied = h.coordinator.wait_for_icons(Duration::from_secs(10));
        assert_eq!(applied, 5);
        assert_eq!(h.coordinator.pending_icons(), 0);
        assert!(h.coordinator.drawer(0).unwrap().items.iter().all(|i| i.icon.is_some()));
    }

    #[test]
    fn test_icon_for_deleted_item_is_discarded() {
        let mut h = harness();
        let file = h.file("a.txt");
        let id = h.coordinator.add_shortcuts(&[file], 0).added[0];
        h.coordinator.delete_shortcut(id);
        assert_eq!(h.coordinator.wait_for_icons(Duration::from_secs(10)), 0);
        assert_eq!(h.coordinator.pending_icons(), 0);
    }

    #[test]
    fn test_startup_failure_is_reported() {
        let mut shell = FakeShell::default();
        shell.fail_startup = true;
        let h = harness_with(vec![Drawer::new("Tools")], shell);
        let mut settings = Settings::default();
        assert!(!h.coordinator.set_run_at_startup(&mut settings, true));
        assert!(!settings.run_at_startup);
        assert!(matches!(
            h.prompt.notices()[0],
            Notice::StartupFailed { .. }
        ));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/a/Firefox.lnk")), "Firefox");
        assert_eq!(display_name(Path::new("/a/archive.tar.gz")), "archive.tar");
        assert_eq!(display_name(Path::new("/a/.bashrc")), ".bashrc");
    }
}
