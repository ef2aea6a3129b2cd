use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{compare::NaturalOrder, tree::Link, Dir, Links, TreeNode, WavlTree};

/// A cursor over a [`WavlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct Cursor<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree WavlTree<T, C>>,
}

impl<'tree, T, C> Cursor<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree WavlTree<T, C>, ptr: Link<T>) -> Cursor<'tree, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `WavlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_to(Dir::Right) }
    }

    /// Moves the cursor to the previous element of the `WavlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_to(Dir::Left) }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&'tree T> {
        unsafe { self.curs.get() }
    }

    /// Returns a reference to the next item.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek(Dir::Right) }
    }

    /// Returns a reference to the previous item.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek(Dir::Left) }
    }
}

impl<T, C> Clone for Cursor<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                ptr: self.curs.ptr,
            },
            phantom: PhantomData,
        }
    }
}

/// A cursor over a [`WavlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T, C>,
    phantom: PhantomData<&'tree mut WavlTree<T, C>>,
}

impl<'tree, T, C> CursorMut<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree mut WavlTree<T, C>, ptr: Link<T>) -> CursorMut<'tree, T, C> {
        CursorMut {
            curs: CursorRaw {
                tree: tree.into(),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T, C> {
        Cursor {
            curs: CursorRaw {
                tree: self.curs.tree,
                ptr: self.curs.ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `WavlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_to(Dir::Right) }
    }

    /// Moves the cursor to the previous element of the `WavlTree`.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_to(Dir::Left) }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&T> {
        unsafe { self.curs.get() }
    }

    /// Returns a pinned mutable reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element. The
    /// item's key must keep comparing the same way against the other keys in the tree.
    pub fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        unsafe { self.curs.get_mut() }
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek(Dir::Right) }
    }

    /// Returns a reference to the previous item.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek(Dir::Left) }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current(Dir::Right) }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the
    /// cursor is pointing to the "ghost" non-element, this method returns `None`, and neither the
    /// tree nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current(Dir::Left) }
    }
}

struct CursorRaw<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: NonNull<WavlTree<T, C>>,
    ptr: Link<T>,
}

impl<T, C> CursorRaw<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Returns the element following `ptr` in `dir`, wrapping through the ghost.
    unsafe fn neighbour(&self, dir: Dir) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match (self.ptr, dir) {
            (Some(_), dir) => tree.step(self.ptr, dir),
            (None, Dir::Right) => tree.first_raw(),
            (None, Dir::Left) => tree.last_raw(),
        }
    }

    unsafe fn move_to(&mut self, dir: Dir) {
        self.ptr = unsafe { self.neighbour(dir) };
    }

    unsafe fn get<'a>(&self) -> Option<&'a T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn get_mut<'a>(&mut self) -> Option<Pin<&'a mut T>> {
        self.ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    unsafe fn peek<'a>(&self, dir: Dir) -> Option<&'a T> {
        unsafe { self.neighbour(dir) }.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn remove_current(&mut self, dir: Dir) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_to(dir);

            let tree = self.tree.as_mut();
            Some(tree.remove_at(remove))
        }
    }
}
