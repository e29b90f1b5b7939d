//! Array backed binary min-heap.
//! Priority is entirely decided by `T: Ord`, which means equal keys come out
//! in an order that depends on the heap layout.  The tree builder avoids this
//! by giving every element a unique key.

pub struct MinHeap<T: Ord> {
    elements: Vec<T>
}

impl <T: Ord> MinHeap<T> {
    #[cfg(test)]
    pub fn new() -> Self {
        Self {
            elements: Vec::new()
        }
    }
    /// Bulk load in O(n) by sifting down every branch node, last branch first.
    pub fn from_vec(elements: Vec<T>) -> Self {
        let mut heap = Self { elements };
        for i in (0..heap.elements.len()/2).rev() {
            heap.sift_down(i);
        }
        heap
    }
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
    #[cfg(test)]
    pub fn peek(&self) -> Option<&T> {
        self.elements.first()
    }
    pub fn insert(&mut self,val: T) {
        self.elements.push(val);
        self.sift_up(self.elements.len()-1);
    }
    /// Remove and return the smallest element, `None` only if the heap is empty.
    pub fn extract_min(&mut self) -> Option<T> {
        if self.elements.is_empty() {
            return None;
        }
        let last = self.elements.len() - 1;
        self.elements.swap(0,last);
        let ans = self.elements.pop();
        if !self.elements.is_empty() {
            self.sift_down(0);
        }
        ans
    }
    fn sift_up(&mut self,mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.elements[i] >= self.elements[parent] {
                break;
            }
            self.elements.swap(i,parent);
            i = parent;
        }
    }
    fn sift_down(&mut self,mut i: usize) {
        let n = self.elements.len();
        loop {
            let left = 2*i + 1;
            let right = 2*i + 2;
            let mut smallest = i;
            if left < n && self.elements[left] < self.elements[smallest] {
                smallest = left;
            }
            if right < n && self.elements[right] < self.elements[smallest] {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.elements.swap(i,smallest);
            i = smallest;
        }
    }
}

#[test]
fn extracts_in_order() {
    let mut heap = MinHeap::new();
    for x in [5,3,9,1,7,3,0,8] {
        heap.insert(x);
    }
    assert_eq!(heap.len(),8);
    assert_eq!(heap.peek(),Some(&0));
    let mut ans = Vec::new();
    while let Some(x) = heap.extract_min() {
        ans.push(x);
    }
    assert_eq!(ans,vec![0,1,3,3,5,7,8,9]);
    assert!(heap.is_empty());
}

#[test]
fn bulk_load() {
    // pseudo random sequence so the heapify has real work to do
    let dat: Vec<u32> = (0..200).map(|i| (i*7919 + 13) % 211).collect();
    let mut heap = MinHeap::from_vec(dat.clone());
    let mut sorted = dat;
    sorted.sort();
    let mut ans = Vec::new();
    while let Some(x) = heap.extract_min() {
        ans.push(x);
    }
    assert_eq!(ans,sorted);
}

#[test]
fn secondary_key_breaks_ties() {
    let mut heap = MinHeap::from_vec(vec![(2,300),(1,99),(2,7),(1,256),(2,8)]);
    heap.insert((1,3));
    assert_eq!(heap.extract_min(),Some((1,3)));
    assert_eq!(heap.extract_min(),Some((1,99)));
    assert_eq!(heap.extract_min(),Some((1,256)));
    assert_eq!(heap.extract_min(),Some((2,7)));
    assert_eq!(heap.extract_min(),Some((2,8)));
    assert_eq!(heap.extract_min(),Some((2,300)));
    assert_eq!(heap.extract_min(),None);
}
